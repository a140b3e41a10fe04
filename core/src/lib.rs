//! Blocking client for the Posterous HTTP API.
//!
//! # Overview
//! Each API method is a `MethodSpec` (name, auth flag, parameter whitelist).
//! `ApiClient::call` runs any of them through the same pipeline: whitelist
//! the arguments, form-encode them, POST with optional Basic auth, and read
//! the `<rsp stat="...">` envelope into a `Document` or an `ApiError`.
//!
//! ```no_run
//! use posterous_core::{ApiClient, Params};
//!
//! # fn main() -> Result<(), posterous_core::ApiError> {
//! let client = ApiClient::with_credentials("me@example.com", "secret");
//! let posts = client.read_posts(&Params::from([("hostname", "demo"), ("num_posts", "5")]))?;
//! for post in posts.root().children_named("post") {
//!     println!("{}", post.child_text("title").unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - Request building and response parsing never touch the network; the
//!   `Transport` trait is the only I/O seam, so tests run against stubs or
//!   the in-process mock server.
//! - Posting methods refuse to run without credentials before any request
//!   is built.
//! - Every failure is returned; nothing is retried.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod method;
pub mod params;
pub mod response;
pub mod transport;
pub mod xml;

pub use client::{ApiClient, ApiClientBuilder};
pub use config::{ClientConfig, Credentials, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use error::{ApiError, TransportError};
pub use http::{HttpRequest, HttpResponse};
pub use method::MethodSpec;
pub use params::Params;
pub use transport::{Transport, UreqTransport};
pub use xml::{Document, Element};

/// Version of this library, sent in the default user agent.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");
