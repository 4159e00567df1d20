use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sign in</title></head>
<body>
  <h1>App Generator</h1>
  <p><a href="/login/github">Sign in with GitHub</a></p>
  <p>Once signed in, head to <a href="/ui">the generator</a>.</p>
</body>
</html>
"#;

const UI_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>App Generator</title></head>
<body>
  <h1>Generate an app</h1>
  <form id="generate-form">
    <label>Project name <input name="project_name" required></label><br>
    <label>Description <textarea name="description" required></textarea></label><br>
    <button type="submit">Generate</button>
  </form>
  <pre id="result"></pre>
  <script>
    document.getElementById('generate-form').addEventListener('submit', async (ev) => {
      ev.preventDefault();
      const data = Object.fromEntries(new FormData(ev.target));
      const res = await fetch('/generate', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        credentials: 'include',
        body: JSON.stringify(data),
      });
      document.getElementById('result').textContent = JSON.stringify(await res.json(), null, 2);
    });
  </script>
</body>
</html>
"#;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page))
        .route("/ui", get(ui_page))
}

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

pub async fn ui_page() -> Html<&'static str> {
    Html(UI_PAGE)
}
