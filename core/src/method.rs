//! The Posterous method table.
//!
//! Each API method is data: a name (also its URL path segment), whether it
//! needs Basic credentials, and the parameter keys it accepts. Adding a
//! method means adding a `MethodSpec` here and listing it in `ALL`.

/// Static description of one API method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: &'static str,
    pub requires_auth: bool,
    pub params: &'static [&'static str],
}

impl MethodSpec {
    pub fn accepts(&self, key: &str) -> bool {
        self.params.contains(&key)
    }
}

// Reading

pub const GET_SITES: MethodSpec = MethodSpec {
    name: "getsites",
    requires_auth: false,
    params: &[],
};

pub const READ_POSTS: MethodSpec = MethodSpec {
    name: "readposts",
    requires_auth: false,
    params: &["hostname", "site_id", "num_posts", "page", "tag"],
};

pub const GET_TAGS: MethodSpec = MethodSpec {
    name: "gettags",
    requires_auth: false,
    params: &["hostname", "site_id"],
};

// Posting

pub const NEW_POST: MethodSpec = MethodSpec {
    name: "newpost",
    requires_auth: true,
    params: &[
        "site_id",
        "media",
        "title",
        "body",
        "autopost",
        "private",
        "date",
        "tags",
        "source",
        "sourceLink",
    ],
};

pub const UPDATE_POST: MethodSpec = MethodSpec {
    name: "updatepost",
    requires_auth: true,
    params: &["post_id", "media", "title", "body"],
};

pub const NEW_COMMENT: MethodSpec = MethodSpec {
    name: "newcomment",
    requires_auth: false,
    params: &["post_id", "comment", "name", "email", "date"],
};

// Post.ly

pub const GET_POST: MethodSpec = MethodSpec {
    name: "getpost",
    requires_auth: false,
    params: &["id"],
};

// Twitter. These carry the account credentials as form fields instead of
// Basic auth.

pub const UPLOAD: MethodSpec = MethodSpec {
    name: "upload",
    requires_auth: false,
    params: &["username", "password", "media", "message", "body", "source", "sourceLink"],
};

pub const UPLOAD_AND_POST: MethodSpec = MethodSpec {
    name: "uploadAndPost",
    requires_auth: false,
    params: &["username", "password", "media", "message", "body", "source", "sourceLink"],
};

pub const ALL: &[MethodSpec] = &[
    GET_SITES,
    READ_POSTS,
    GET_TAGS,
    NEW_POST,
    UPDATE_POST,
    NEW_COMMENT,
    GET_POST,
    UPLOAD,
    UPLOAD_AND_POST,
];

/// Look a method up by its wire name (case-sensitive).
pub fn lookup(name: &str) -> Option<&'static MethodSpec> {
    ALL.iter().find(|m| m.name == name)
}
