use axum::response::{Html, IntoResponse};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Water Meters</title>
</head>
<body>
  <h1>Water Meters</h1>
  <p>Upload a photo of a water meter to receive a binary segmentation mask.</p>
  <form action="/predict" method="post" enctype="multipart/form-data">
    <input type="file" name="image" accept="image/*" required>
    <button type="submit">Predict</button>
  </form>
  <p><a href="/health">health</a> &middot; <a href="/metrics">metrics</a></p>
</body>
</html>
"#;

pub async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}
