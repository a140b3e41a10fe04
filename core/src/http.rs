//! HTTP request and response types for the host-does-IO pattern.
//!
//! # Design
//! `ApiClient::build_request` produces an `HttpRequest` and
//! `ApiClient::parse_response` consumes an `HttpResponse`; neither touches the
//! network. Every Posterous call is a POST, so the method is implied rather
//! than stored. A `Transport` (see `transport.rs`) executes the round-trip in
//! between, or the caller can do it by hand.

/// A POST request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// `None` when there are no parameters to send.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// The status code is carried for diagnostics only; the envelope inside
/// `body` decides success or failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}
