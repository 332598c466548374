//! File-serving collaborator for plain (non-upgrade) requests.
//!
//! Thin wrapper over `tower_http::services::ServeDir`: directory requests get
//! `index.html`, missing files get `404`, and path traversal outside the root
//! is refused by `ServeDir` itself.

use std::convert::Infallible;
use std::path::Path;

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::BodyExt;
use hyper::{Request, Response};
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Response body shared by every reply the bridge produces.
pub type BridgeBody = UnsyncBoxBody<Bytes, std::io::Error>;

/// Serves files from one directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    dir: ServeDir,
}

impl StaticFiles {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: ServeDir::new(root.as_ref()),
        }
    }

    /// Answers `req` from disk.
    pub async fn serve<B>(&self, req: Request<B>) -> Response<BridgeBody>
    where
        B: Send + 'static,
    {
        let result: Result<_, Infallible> = self.dir.clone().oneshot(req).await;
        match result {
            Ok(response) => response.map(|body| body.boxed_unsync()),
            Err(never) => match never {},
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Empty;
    use hyper::StatusCode;
    use std::path::PathBuf;

    fn temp_web_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ws-tcp-bridge-web-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<h1>bridge</h1>").unwrap();
        dir
    }

    async fn body_text(response: Response<BridgeBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_root_serves_index_html() {
        // Arrange
        let root = temp_web_root();
        let files = StaticFiles::new(&root);
        let req = Request::get("/").body(Empty::<Bytes>::new()).unwrap();

        // Act
        let response = files.serve(req).await;

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "<h1>bridge</h1>");
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let root = temp_web_root();
        let files = StaticFiles::new(&root);
        let req = Request::get("/nope.js").body(Empty::<Bytes>::new()).unwrap();

        let response = files.serve(req).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let _ = std::fs::remove_dir_all(root);
    }
}
