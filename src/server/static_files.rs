//! Console shell: serve the built frontend from `console/dist` when present,
//! fall back to an embedded page that is just enough console to poke the API.

use axum::response::Html;

/// Directory the console build lands in, relative to the working directory.
pub const CONSOLE_DIST_DIR: &str = "console/dist";

pub async fn console_page() -> Html<&'static str> {
    Html(CONSOLE_PAGE)
}

const CONSOLE_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>cryodex console</title>
<style>
  body { font-family: monospace; background: #10141a; color: #cdd6e4; margin: 2rem; }
  h1 { color: #7fd4ff; font-size: 1.3rem; }
  fieldset { border: 1px solid #2c3a4d; margin-bottom: 1rem; }
  legend { color: #7fd4ff; }
  input, select, button { font-family: inherit; background: #1a222d; color: #cdd6e4; border: 1px solid #2c3a4d; padding: 0.25rem 0.5rem; }
  button { cursor: pointer; }
  pre { background: #0b0e13; border: 1px solid #2c3a4d; padding: 1rem; overflow: auto; max-height: 30rem; }
</style>
</head>
<body>
<h1>cryodex console</h1>
<p>The built console was not found in <code>console/dist</code>; this is the embedded fallback.</p>

<fieldset>
  <legend>service</legend>
  <button onclick="call('GET', '/api/health')">health</button>
  <button onclick="call('GET', '/api/collections')">collections</button>
  <button onclick="call('GET', '/api/crew?owned_only=1')">owned crew</button>
  <button onclick="call('GET', '/api/data/version')">data version</button>
  <button onclick="call('GET', '/api/sync/status')">sync status</button>
</fieldset>

<fieldset>
  <legend>score</legend>
  <label><input type="checkbox" id="score-sale"> citation sale</label>
  <label>limit <input type="number" id="score-limit" value="25" size="4"></label>
  <button onclick="score()">score crew</button>
</fieldset>

<fieldset>
  <legend>optimize</legend>
  <label>collection <input type="text" id="opt-collection" placeholder="id or name"></label>
  <label>mode
    <select id="opt-mode">
      <option value="normal">normal</option>
      <option value="exact-only">exact-only</option>
      <option value="inexact-only">inexact-only</option>
      <option value="extended">extended</option>
    </select>
  </label>
  <label><input type="checkbox" id="opt-sale"> citation sale</label>
  <button onclick="optimize()">discover combos</button>
</fieldset>

<pre id="output">ready</pre>

<script>
const output = document.getElementById('output');

async function call(method, url, body) {
  output.textContent = method + ' ' + url + ' ...';
  try {
    const response = await fetch(url, {
      method,
      headers: body ? { 'content-type': 'application/json' } : {},
      body,
    });
    const text = await response.text();
    output.textContent = response.status + '\n' + text;
  } catch (err) {
    output.textContent = 'request failed: ' + err;
  }
}

function score() {
  const body = JSON.stringify({
    sale: document.getElementById('score-sale').checked,
    limit: Number(document.getElementById('score-limit').value) || 25,
  });
  call('POST', '/api/score', body);
}

function optimize() {
  const body = JSON.stringify({
    collection: document.getElementById('opt-collection').value,
    mode: document.getElementById('opt-mode').value,
    sale: document.getElementById('opt-sale').checked,
  });
  call('POST', '/api/optimize', body);
}
</script>
</body>
</html>
"#;
