//! Synthesized offline responses.

use swcache_core::CachedResponse;

const OFFLINE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Offline</title>
  <style>
    body {
      margin: 0;
      min-height: 100vh;
      display: flex;
      align-items: center;
      justify-content: center;
      font-family: system-ui, -apple-system, sans-serif;
      background: linear-gradient(135deg, #4f46e5, #7c3aed);
      color: #fff;
      text-align: center;
    }
    .card {
      max-width: 28rem;
      padding: 2.5rem 2rem;
      border-radius: 1rem;
      background: rgba(255, 255, 255, 0.12);
      border: 1px solid rgba(255, 255, 255, 0.25);
    }
    h1 { margin: 0 0 1rem; font-size: 1.75rem; }
    p { margin: 0 0 1.5rem; line-height: 1.5; opacity: 0.9; }
    button {
      padding: 0.75rem 1.75rem;
      border-radius: 999px;
      border: 2px solid rgba(255, 255, 255, 0.4);
      background: transparent;
      color: inherit;
      font-size: 1rem;
      cursor: pointer;
    }
  </style>
</head>
<body>
  <main class="card">
    <h1>You're offline</h1>
    <p>This page isn't available without a connection. Pages you've already visited may still load.</p>
    <button type="button" onclick="location.reload()">Try again</button>
  </main>
  <script>
    window.addEventListener('online', () => location.reload());
  </script>
</body>
</html>
"#;

const PLACEHOLDER_SVG: &str = r##"<svg width="400" height="300" xmlns="http://www.w3.org/2000/svg" role="img" aria-label="Image unavailable offline">
  <rect width="100%" height="100%" fill="#f0f0f0"/>
  <text x="50%" y="50%" font-family="Arial, sans-serif" font-size="16" fill="#999" text-anchor="middle" dy=".3em">Image unavailable offline</text>
</svg>
"##;

/// Minimal offline page for navigations when no offline document is cached.
pub fn offline_page(url: &str) -> CachedResponse {
    CachedResponse::new(url, 200, OFFLINE_HTML).with_header("content-type", "text/html; charset=utf-8")
}

/// Placeholder graphic for images that can't be fetched or found.
pub fn placeholder_image(url: &str) -> CachedResponse {
    CachedResponse::new(url, 200, PLACEHOLDER_SVG).with_header("content-type", "image/svg+xml")
}

/// Structured 503 body for everything else.
pub fn offline_json(url: &str) -> CachedResponse {
    let body = serde_json::json!({
        "error": "Offline",
        "message": "This content is not available offline",
    });
    CachedResponse::new(url, 503, body.to_string()).with_header("content-type", "application/json")
}
