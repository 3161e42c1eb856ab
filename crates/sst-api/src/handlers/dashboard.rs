//! Dashboard page.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Serve the live dashboard.
pub async fn dashboard() -> Html<&'static str> {
    Html(INDEX_HTML)
}
