//! HTTP handlers for static page rendering.

use axum::response::Html;
use minijinja::context;

use crate::errors::Result;
use crate::templates;

/// Landing page with the upload form. No side effects.
pub async fn index() -> Result<Html<String>> {
    Ok(templates::render("index.html", context! {})?)
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::processor::create_processor;
    use crate::{AppState, build_router};
    use axum::http::StatusCode;
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_index_returns_landing_page() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            upload_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let processor = create_processor(&config.processor);
        let server = TestServer::new(build_router(&AppState { config, processor })).unwrap();

        let response = server.get("/").await;

        response.assert_status(StatusCode::OK);
        let text = response.text();
        assert!(text.contains("<form"));
        assert!(text.contains("name=\"file\""));
    }
}
