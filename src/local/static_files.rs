//! Static file serving from a local directory.
//!
//! # Responsibilities
//! - Offer GET/HEAD requests to `tower_http::services::ServeDir` below a root
//! - Serve the configured index file for paths ending in `/`
//! - Decline (hand the request back) when no file exists
//!
//! # Design Decisions
//! - `ServeDir` does percent-decoding, traversal rejection, MIME detection,
//!   ranges and conditional requests
//! - The lookup uses a body-less copy of the request so a miss can pass the
//!   original, body intact, to the upstream
//! - A directory path without a trailing slash declines instead of redirecting

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, Uri},
};
use futures_util::future::{BoxFuture, FutureExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use super::LocalResolver;
use crate::config::ProxyConfig;
use crate::routing::Outcome;

/// Serves files below `root`.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: Arc<PathBuf>,
    index_file: Arc<str>,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
            index_file: Arc::from("index.html"),
        }
    }

    pub fn with_index_file(mut self, index_file: &str) -> Self {
        self.index_file = Arc::from(index_file);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl LocalResolver for StaticFiles {
    fn attempt(
        &self,
        request: Request<Body>,
        _config: Arc<ProxyConfig>,
    ) -> BoxFuture<'static, Outcome> {
        let files = self.clone();
        async move { files.serve(request).await }.boxed()
    }
}

impl StaticFiles {
    async fn serve(&self, request: Request<Body>) -> Outcome {
        let method = request.method();
        if method != Method::GET && method != Method::HEAD {
            return Outcome::Pass(request);
        }
        let Some(uri) = index_target(request.uri(), &self.index_file) else {
            return Outcome::Pass(request);
        };

        let mut lookup = Request::new(Body::empty());
        *lookup.method_mut() = request.method().clone();
        *lookup.uri_mut() = uri;
        *lookup.headers_mut() = request.headers().clone();

        let service = ServeDir::new(self.root()).append_index_html_on_directories(false);
        let response = match service.oneshot(lookup).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        if response.status() == StatusCode::NOT_FOUND {
            return Outcome::Pass(request);
        }
        tracing::debug!(
            root = %self.root.display(),
            path = %request.uri().path(),
            status = %response.status(),
            "Serving local file"
        );
        Outcome::Handled(response.map(Body::new))
    }
}

/// Append the index file to directory-style paths, keeping the query.
fn index_target(uri: &Uri, index_file: &str) -> Option<Uri> {
    if !uri.path().ends_with('/') {
        return Some(uri.clone());
    }
    let target = match uri.query() {
        Some(query) => format!("{}{}?{}", uri.path(), index_file, query),
        None => format!("{}{}", uri.path(), index_file),
    };
    target.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use http_body_util::BodyExt;

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hello local").unwrap();
        std::fs::write(dir.path().join("my file.txt"), "spaced").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs").join("index.html"), "<h1>docs</h1>").unwrap();
        std::fs::write(dir.path().join("docs").join("home.htm"), "<h1>home</h1>").unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        dir
    }

    async fn attempt(files: &StaticFiles, req: Request<Body>) -> Outcome {
        files.attempt(req, Arc::new(ProxyConfig::default())).await
    }

    async fn served_body(outcome: Outcome) -> Vec<u8> {
        let Outcome::Handled(response) = outcome else {
            panic!("file should be served");
        };
        assert_eq!(response.status(), StatusCode::OK);
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_serves_existing_file() {
        let dir = fixture();
        let files = StaticFiles::new(dir.path());

        let Outcome::Handled(response) = attempt(&files, request(Method::GET, "/hello.txt?v=2")).await
        else {
            panic!("file should be served");
        };
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "11");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"hello local");
    }

    #[tokio::test]
    async fn test_percent_encoded_path_is_decoded() {
        let dir = fixture();
        let files = StaticFiles::new(dir.path());

        let body = served_body(attempt(&files, request(Method::GET, "/my%20file.txt")).await).await;
        assert_eq!(body, b"spaced");
    }

    #[tokio::test]
    async fn test_directory_uses_index_file() {
        let dir = fixture();

        let files = StaticFiles::new(dir.path());
        let body = served_body(attempt(&files, request(Method::GET, "/docs/")).await).await;
        assert_eq!(body, b"<h1>docs</h1>");

        let files = StaticFiles::new(dir.path()).with_index_file("home.htm");
        let body = served_body(attempt(&files, request(Method::GET, "/docs/?lang=en")).await).await;
        assert_eq!(body, b"<h1>home</h1>");

        let outcome = attempt(&files, request(Method::GET, "/empty/")).await;
        assert!(!outcome.is_handled());
        let outcome = attempt(&files, request(Method::GET, "/docs")).await;
        assert!(!outcome.is_handled());
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let dir = fixture();
        let files = StaticFiles::new(dir.path());

        let Outcome::Handled(response) = attempt(&files, request(Method::HEAD, "/hello.txt")).await
        else {
            panic!("file should be served");
        };
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "11");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_declines_without_touching_request() {
        let dir = fixture();
        let files = StaticFiles::new(dir.path());

        let mut upload = request(Method::POST, "/hello.txt");
        *upload.body_mut() = Body::from("kept");
        match attempt(&files, upload).await {
            Outcome::Pass(returned) => {
                let body = returned.into_body().collect().await.unwrap().to_bytes();
                assert_eq!(&body[..], b"kept");
            }
            Outcome::Handled(_) => panic!("POST should not be served"),
        }

        for req in [
            request(Method::GET, "/missing.txt"),
            request(Method::GET, "/../hello.txt"),
        ] {
            let uri = req.uri().clone();
            match attempt(&files, req).await {
                Outcome::Pass(returned) => assert_eq!(returned.uri(), &uri),
                Outcome::Handled(_) => panic!("{uri} should not be served"),
            }
        }
    }

    #[test]
    fn test_index_target() {
        let uri: Uri = "/a/?x=1".parse().unwrap();
        assert_eq!(index_target(&uri, "index.html").unwrap(), "/a/index.html?x=1");
        let uri: Uri = "/a/b.txt".parse().unwrap();
        assert_eq!(index_target(&uri, "index.html").unwrap(), "/a/b.txt");
    }
}
