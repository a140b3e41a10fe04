use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::post,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use quick_xml::escape::escape;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use url::form_urlencoded;

pub const DEFAULT_USERNAME: &str = "demo@example.com";
pub const DEFAULT_PASSWORD: &str = "demo";

#[derive(Clone, Debug)]
pub struct Account {
    pub username: String,
    pub password: String,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Site {
    pub id: u64,
    pub name: String,
    pub hostname: String,
}

#[derive(Clone, Debug)]
pub struct Post {
    pub id: u64,
    pub site_id: u64,
    pub short_code: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub comments: Vec<String>,
}

/// One request as the server saw it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub params: Vec<(String, String)>,
    /// Username from the Basic auth header, if any.
    pub auth_user: Option<String>,
    pub content_type: Option<String>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
pub struct Store {
    pub sites: Vec<Site>,
    pub posts: Vec<Post>,
    pub requests: Vec<RecordedRequest>,
    next_post_id: u64,
    next_media_id: u64,
}

impl Store {
    /// One site (`demo`, id 1) with one tagged post.
    pub fn seeded() -> Self {
        let mut store = Store {
            sites: vec![Site {
                id: 1,
                name: "Demo".to_string(),
                hostname: "demo".to_string(),
            }],
            next_post_id: 1,
            next_media_id: 1,
            ..Store::default()
        };
        store.add_post(1, "Hello world", "First post", vec!["intro".to_string()]);
        store
    }

    fn add_post(&mut self, site_id: u64, title: &str, body: &str, tags: Vec<String>) -> Post {
        let id = self.next_post_id;
        self.next_post_id += 1;
        let post = Post {
            id,
            site_id,
            short_code: format!("p{id}"),
            title: title.to_string(),
            body: body.to_string(),
            tags,
            comments: Vec::new(),
        };
        self.posts.push(post.clone());
        post
    }

    fn site(&self, params: &Params) -> Option<&Site> {
        if let Some(id) = params.get("site_id") {
            return self.sites.iter().find(|s| s.id.to_string() == id);
        }
        if let Some(hostname) = params.get("hostname") {
            return self.sites.iter().find(|s| s.hostname == hostname);
        }
        self.sites.first()
    }
}

pub struct AppState {
    pub account: Account,
    pub store: RwLock<Store>,
}

impl AppState {
    pub fn new(account: Account) -> Arc<Self> {
        Arc::new(Self {
            account,
            store: RwLock::new(Store::seeded()),
        })
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.store.read().await.requests.clone()
    }
}

pub type Shared = Arc<AppState>;

pub fn app() -> Router {
    app_with_state(AppState::new(Account::default()))
}

pub fn app_with_state(state: Shared) -> Router {
    Router::new()
        .route("/api/{method}", post(dispatch))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, state: Shared) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

struct Params(Vec<(String, String)>);

impl Params {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

async fn dispatch(
    State(state): State<Shared>,
    Path(method): Path<String>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let params = Params(form_urlencoded::parse(body.as_bytes()).into_owned().collect());
    let auth = basic_auth(&headers);
    let authorized = auth
        .as_ref()
        .is_some_and(|(u, p)| *u == state.account.username && *p == state.account.password);

    let mut store = state.store.write().await;
    store.requests.push(RecordedRequest {
        method: method.clone(),
        params: params.0.clone(),
        auth_user: auth.map(|(u, _)| u),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });
    info!(%method, params = params.0.len(), authorized, "handling request");

    let result = match method.as_str() {
        "getsites" => Ok(get_sites(&store)),
        "readposts" => read_posts(&store, &params),
        "gettags" => get_tags(&store, &params),
        "newpost" if authorized => new_post(&mut store, &params),
        "updatepost" if authorized => update_post(&mut store, &params),
        "newpost" | "updatepost" => Err(BAD_LOGIN),
        "newcomment" => new_comment(&mut store, &params),
        "getpost" => get_post(&store, &params),
        "upload" | "uploadAndPost" => upload(&mut store, &state.account, &params, method == "uploadAndPost"),
        _ => Err(INVALID_METHOD),
    };

    let xml = match result {
        Ok(content) => format!(r#"<?xml version="1.0" encoding="UTF-8"?><rsp stat="ok">{content}</rsp>"#),
        Err((code, msg)) => {
            format!(r#"<?xml version="1.0" encoding="UTF-8"?><rsp stat="fail"><err code="{code}" msg="{msg}" /></rsp>"#)
        }
    };
    ([(header::CONTENT_TYPE, "text/xml; charset=utf-8")], xml)
}

type Failure = (u32, &'static str);
type Outcome = Result<String, Failure>;

const INVALID_METHOD: Failure = (1, "Invalid method");
const BAD_LOGIN: Failure = (3001, "Invalid Posterous email or password");
const BAD_POST: Failure = (3002, "Invalid post id");
const BAD_SITE: Failure = (3003, "Invalid site id");
const MISSING_COMMENT: Failure = (3004, "Comment is required");

fn basic_auth(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(token).ok()?).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn post_xml(post: &Post) -> String {
    let tags: String = post
        .tags
        .iter()
        .map(|t| format!("<tag>{}</tag>", escape(t)))
        .collect();
    format!(
        "<post><id>{}</id><url>http://post.ly/{}</url><title>{}</title><body>{}</body>{tags}<commentsCount>{}</commentsCount></post>",
        post.id,
        post.short_code,
        escape(&post.title),
        escape(&post.body),
        post.comments.len(),
    )
}

fn get_sites(store: &Store) -> String {
    store
        .sites
        .iter()
        .map(|site| {
            let num_posts = store.posts.iter().filter(|p| p.site_id == site.id).count();
            format!(
                "<site><id>{}</id><name>{}</name><url>http://{}.posterous.com</url><private>false</private><num_posts>{num_posts}</num_posts></site>",
                site.id,
                escape(&site.name),
                escape(&site.hostname),
            )
        })
        .collect()
}

fn read_posts(store: &Store, params: &Params) -> Outcome {
    let site = store.site(params).ok_or(BAD_SITE)?;
    let num_posts = params.get("num_posts").and_then(|n| n.parse().ok()).unwrap_or(10usize).min(50);
    let page = params.get("page").and_then(|n| n.parse().ok()).unwrap_or(1usize).max(1);
    let tag = params.get("tag");

    Ok(store
        .posts
        .iter()
        .rev()
        .filter(|p| p.site_id == site.id)
        .filter(|p| tag.is_none_or(|t| p.tags.iter().any(|x| x == t)))
        .skip((page - 1).saturating_mul(num_posts))
        .take(num_posts)
        .map(post_xml)
        .collect())
}

fn get_tags(store: &Store, params: &Params) -> Outcome {
    let site = store.site(params).ok_or(BAD_SITE)?;
    let mut tags: Vec<(&str, usize)> = Vec::new();
    for tag in store.posts.iter().filter(|p| p.site_id == site.id).flat_map(|p| &p.tags) {
        match tags.iter_mut().find(|(t, _)| *t == tag) {
            Some(entry) => entry.1 += 1,
            None => tags.push((tag.as_str(), 1)),
        }
    }
    Ok(tags
        .iter()
        .enumerate()
        .map(|(i, (name, count))| {
            format!("<tag><id>{}</id><tag_name>{}</tag_name><count>{count}</count></tag>", i + 1, escape(*name))
        })
        .collect())
}

fn new_post(store: &mut Store, params: &Params) -> Outcome {
    let site_id = store.site(params).ok_or(BAD_SITE)?.id;
    let tags = params
        .get("tags")
        .map(|t| t.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    let post = store.add_post(
        site_id,
        params.get("title").unwrap_or("Untitled"),
        params.get("body").unwrap_or_default(),
        tags,
    );
    Ok(post_xml(&post))
}

fn update_post(store: &mut Store, params: &Params) -> Outcome {
    let id = params.get("post_id").ok_or(BAD_POST)?;
    let post = store
        .posts
        .iter_mut()
        .find(|p| p.id.to_string() == id)
        .ok_or(BAD_POST)?;
    if let Some(title) = params.get("title") {
        post.title = title.to_string();
    }
    if let Some(body) = params.get("body") {
        post.body = body.to_string();
    }
    Ok(post_xml(post))
}

fn new_comment(store: &mut Store, params: &Params) -> Outcome {
    let id = params.get("post_id").ok_or(BAD_POST)?;
    let comment = params.get("comment").filter(|c| !c.is_empty()).ok_or(MISSING_COMMENT)?;
    let post = store
        .posts
        .iter_mut()
        .find(|p| p.id.to_string() == id)
        .ok_or(BAD_POST)?;
    post.comments.push(comment.to_string());
    Ok(format!("<comment><id>{}</id></comment>", post.comments.len()))
}

fn get_post(store: &Store, params: &Params) -> Outcome {
    let code = params.get("id").ok_or(BAD_POST)?;
    store
        .posts
        .iter()
        .find(|p| p.short_code == code)
        .map(post_xml)
        .ok_or(BAD_POST)
}

fn upload(store: &mut Store, account: &Account, params: &Params, and_post: bool) -> Outcome {
    if params.get("username") != Some(account.username.as_str())
        || params.get("password") != Some(account.password.as_str())
    {
        return Err(BAD_LOGIN);
    }
    let media_id = store.next_media_id;
    store.next_media_id += 1;
    let mut content = format!("<mediaid>m{media_id}</mediaid><mediaurl>http://post.ly/m{media_id}</mediaurl>");
    if and_post {
        let site_id = store.sites.first().map(|s| s.id).ok_or(BAD_SITE)?;
        let post = store.add_post(
            site_id,
            params.get("message").unwrap_or("Untitled"),
            params.get("body").unwrap_or_default(),
            Vec::new(),
        );
        content.push_str(&format!("<postid>{}</postid>", post.id));
    }
    Ok(content)
}
