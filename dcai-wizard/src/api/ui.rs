//! Embedded wizard UI
//!
//! Single HTML page (vanilla ES6+, no frameworks) driving the wizard and
//! proxy APIs. Styling is intentionally minimal.

use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::AppState;

/// GET /
///
/// Wizard landing page: the 4-step flow in one document, step visibility
/// driven by the session snapshot.
pub async fn root_page() -> impl IntoResponse {
    Html(PAGE_HTML.replace("{{VERSION}}", env!("CARGO_PKG_VERSION")))
}

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/", get(root_page))
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>DataCleanAI</title>
<style>
body { font-family: sans-serif; max-width: 860px; margin: 0 auto; padding: 20px; }
nav span { margin-right: 12px; }
nav span.done { font-weight: bold; }
nav span.current { text-decoration: underline; }
section { display: none; border: 1px solid #ccc; padding: 16px; margin-top: 12px; }
section.active { display: block; }
textarea { width: 100%; min-height: 120px; }
table { border-collapse: collapse; margin-top: 8px; }
td, th { border: 1px solid #999; padding: 4px 8px; }
pre { background: #f4f4f4; padding: 8px; overflow-x: auto; }
.error { color: #b00; }
footer { margin-top: 24px; color: #888; font-size: 12px; }
</style>
</head>
<body>
<h1>DataCleanAI</h1>
<nav id="steps"></nav>
<div id="message" class="error"></div>

<section id="step-1">
  <h2>Upload PDF</h2>
  <input type="file" id="file-input" accept="application/pdf">
  <button id="upload-btn">Upload</button>
  <p id="file-info"></p>
</section>

<section id="step-2">
  <h2>Text Extraction</h2>
  <button id="extract-btn">Extract Text</button>
  <textarea id="extracted-text" placeholder="Extracted text appears here"></textarea>
  <button id="save-text-btn">Save Text</button>
</section>

<section id="step-3">
  <h2>Process with AI</h2>
  <select id="template-select"><option value="">Custom prompt</option></select>
  <textarea id="prompt" placeholder="Cleaning prompt"></textarea>
  <input id="provider" placeholder="AI provider">
  <input id="api-key" placeholder="API key" type="password">
  <button id="clean-btn">Clean with AI</button>
  <div id="data-preview"></div>
</section>

<section id="step-4">
  <h2>Database Integration</h2>
  <input id="table-name" placeholder="Table name">
  <select id="query-type">
    <option value="insert">Standard INSERT Query</option>
    <option value="ai">AI Generated Query</option>
  </select>
  <textarea id="ai-prompt" placeholder="Describe the query you need"></textarea>
  <button id="generate-btn">Generate Query</button>
  <pre id="sql-output"></pre>
  <p>
    <a href="/api/wizard/export/csv">Download CSV</a>
    <a href="/api/wizard/export/json">Download JSON</a>
  </p>
</section>

<p>
  <button id="prev-btn">Previous Step</button>
  <button id="next-btn">Next Step</button>
  <button id="reset-btn">Restart Wizard</button>
</p>
<footer>dcai-wizard v{{VERSION}}</footer>

<script>
let session = null;

async function api(path, options) {
  const response = await fetch(path, options);
  const body = await response.json().catch(() => ({}));
  if (!response.ok) {
    throw new Error(body.error || 'Request failed');
  }
  return body;
}

function jsonRequest(method, payload) {
  return { method, headers: { 'Content-Type': 'application/json' }, body: JSON.stringify(payload) };
}

function showMessage(text) {
  document.getElementById('message').textContent = text || '';
}

function render() {
  if (!session || !session.hasHydrated) return;
  const nav = document.getElementById('steps');
  nav.innerHTML = '';
  session.steps.forEach((step, i) => {
    const span = document.createElement('span');
    span.textContent = (i + 1) + '. ' + step.name;
    if (step.status === 'complete') span.classList.add('done');
    if (i + 1 === session.currentStep) span.classList.add('current');
    nav.appendChild(span);
  });
  for (let i = 1; i <= 4; i++) {
    document.getElementById('step-' + i).classList.toggle('active', session.currentStep === i);
  }
  document.getElementById('file-info').textContent =
    session.uploadedFile ? session.uploadedFile.name + ' (' + session.uploadedFile.size + ' bytes)' : '';
  document.getElementById('extracted-text').value = session.extractedText;
  document.getElementById('prompt').value = session.prompt;
  document.getElementById('table-name').value = session.tableName;
  document.getElementById('query-type').value = session.queryType;
  document.getElementById('ai-prompt').value = session.aiPrompt;
  document.getElementById('extract-btn').disabled = session.isExtracting;
  document.getElementById('clean-btn').disabled = session.isProcessing;
  renderPreview();
}

function renderPreview() {
  const preview = document.getElementById('data-preview');
  preview.innerHTML = '';
  if (!session.processedData || session.processedData.length === 0) return;
  const table = document.createElement('table');
  session.processedData.forEach((row, index) => {
    const tr = document.createElement('tr');
    row.forEach(cell => {
      const el = document.createElement(index === 0 ? 'th' : 'td');
      el.textContent = cell;
      tr.appendChild(el);
    });
    table.appendChild(tr);
  });
  preview.appendChild(table);
}

async function refresh() {
  session = await api('/api/wizard');
  render();
}

async function run(action) {
  showMessage('');
  try {
    await action();
    await refresh();
  } catch (e) {
    showMessage(e.message);
    await refresh();
  }
}

document.getElementById('upload-btn').onclick = () => run(async () => {
  const input = document.getElementById('file-input');
  if (!input.files.length) throw new Error('Choose a PDF first');
  const form = new FormData();
  form.append('file', input.files[0]);
  await api('/api/upload-file', { method: 'POST', body: form });
  await api('/api/wizard/step-status', jsonRequest('POST', { index: 0, status: 'complete' }));
});

document.getElementById('extract-btn').onclick = () => run(async () => {
  const generation = session.generation;
  const { file_url } = await api('/api/upload-file');
  const result = await api('/api/extract-text', jsonRequest('POST', { fileUrl: file_url }));
  await api('/api/wizard/text', jsonRequest('PUT', { text: result.text || '', generation }));
  await api('/api/wizard/step-status', jsonRequest('POST', { index: 1, status: 'complete' }));
});

document.getElementById('save-text-btn').onclick = () => run(async () => {
  const text = document.getElementById('extracted-text').value;
  await api('/api/wizard/text', jsonRequest('PUT', { text }));
});

document.getElementById('clean-btn').onclick = () => run(async () => {
  const generation = session.generation;
  const payload = {
    extracted_text: session.extractedText,
    user_prompt: document.getElementById('prompt').value,
    ai_provider: document.getElementById('provider').value,
    user_api_key: document.getElementById('api-key').value,
  };
  await api('/api/wizard/fields', jsonRequest('PUT', { prompt: payload.user_prompt }));
  const result = await api('/api/clean-with-ai', jsonRequest('POST', payload));
  await api('/api/wizard/data', jsonRequest('PUT', { records: result.content || null, generation }));
  await api('/api/wizard/step-status', jsonRequest('POST', { index: 2, status: 'complete' }));
});

document.getElementById('generate-btn').onclick = () => run(async () => {
  const tableName = document.getElementById('table-name').value;
  const queryType = document.getElementById('query-type').value;
  const aiPrompt = document.getElementById('ai-prompt').value;
  await api('/api/wizard/fields', jsonRequest('PUT', { tableName, queryType, aiPrompt }));
  let sql = '';
  if (queryType === 'insert') {
    const response = await fetch('/api/wizard/export/sql');
    if (!response.ok) {
      const body = await response.json().catch(() => ({}));
      throw new Error(body.error || 'Failed to generate SQL query');
    }
    sql = await response.text();
  } else {
    const grid = session.processedData || [];
    const result = await api('/api/generate-ai-query', jsonRequest('POST', {
      tableName,
      headers: session.columnOrder,
      sampleData: grid.slice(1, 6),
      totalRows: Math.max(grid.length - 1, 0),
      userPrompt: aiPrompt,
      apiKey: document.getElementById('api-key').value,
      provider: document.getElementById('provider').value,
    }));
    sql = result.query || '';
  }
  document.getElementById('sql-output').textContent = sql;
  await api('/api/wizard/step-status', jsonRequest('POST', { index: 3, status: 'complete' }));
});

document.getElementById('template-select').onchange = (event) => run(async () => {
  await api('/api/wizard/fields', jsonRequest('PUT', { selectedTemplate: event.target.value }));
});

document.getElementById('next-btn').onclick = () => run(() => api('/api/wizard/next', { method: 'POST' }));
document.getElementById('prev-btn').onclick = () => run(() => api('/api/wizard/previous', { method: 'POST' }));
document.getElementById('reset-btn').onclick = () => run(() => api('/api/wizard/reset', { method: 'POST' }));

async function loadTemplates() {
  try {
    const result = await api('/api/prompt-templates');
    const select = document.getElementById('template-select');
    (result.templates || []).forEach(template => {
      const option = document.createElement('option');
      option.value = template.id;
      option.textContent = template.name;
      select.appendChild(option);
    });
  } catch (e) {
    // Template catalog is optional; the custom prompt path still works
  }
}

(async () => {
  await refresh();
  await api('/api/wizard/restore-file', { method: 'POST' });
  await refresh();
  loadTemplates();
})();
</script>
</body>
</html>
"#;
