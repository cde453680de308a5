//! HTTP API handlers

pub mod health;
pub mod jobs;

pub use health::health_routes;
pub use jobs::job_routes;

use axum::response::{Html, IntoResponse};

/// GET /
///
/// Minimal landing page naming the service and its endpoints.
pub async fn root_page() -> impl IntoResponse {
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Clarion Media Enhancement</title>
</head>
<body>
    <h1>Clarion Media Enhancement v{}</h1>
    <ul>
        <li><code>POST /jobs</code> &mdash; submit a batch of files for enhancement</li>
        <li><code>GET /jobs/{{job_id}}</code> &mdash; poll batch status</li>
        <li><code>GET /health</code> &mdash; service health</li>
    </ul>
</body>
</html>
"#,
        env!("CARGO_PKG_VERSION")
    );

    Html(html)
}
