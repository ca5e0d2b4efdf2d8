//! HTML templates for the web interface.
//!
//! The page is rendered on the server; a small inline script handles Google
//! login, the drop zone and the sequential upload queue in the browser.
//! History navigation swaps the `#history` section in place so the queue
//! survives paging.

use crate::models::UploadRecord;
use crate::pagination::{PageToken, Pagination};

/// Base HTML template.
pub fn base_template(title: &str, content: &str, client_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - gamedrop</title>
    <link rel="stylesheet" href="/static/style.css">
    <script src="https://accounts.google.com/gsi/client" async defer></script>
</head>
<body>
    <main id="app" data-client-id="{client_id}">
        <header id="main-header">
            <h1>{title}</h1>
            <div id="login-area">
                <button id="login-button" class="btn">Login with Google</button>
                <p id="login-status" hidden>You are logged in. Drop archives below to start uploading.</p>
            </div>
        </header>
        {content}
    </main>
    <script>{script}</script>
</body>
</html>"#,
        title = html_escape(title),
        client_id = html_escape(client_id),
        content = content,
        script = UPLOAD_SCRIPT,
    )
}

/// Drop zone, queued file list and upload button. Hidden until login.
pub fn upload_section() -> String {
    r#"
    <section id="upload-section" hidden>
        <div id="dropzone" class="dropzone">
            <input type="file" id="file-input" accept=".zip,application/zip" multiple hidden>
            <p>Drag &amp; drop .zip files here, or click to choose files</p>
        </div>
        <div id="queue" hidden>
            <h3>Upload queue</h3>
            <ul id="queue-list"></ul>
        </div>
        <button id="upload-button" class="btn btn-wide" disabled>Upload 0 files</button>
    </section>
    "#
    .to_string()
}

/// History table for the current page plus navigation.
pub fn history_section(records: &[UploadRecord], pagination: &Pagination) -> String {
    if pagination.total_items() == 0 {
        return r#"<section id="history" hidden></section>"#.to_string();
    }

    let mut rows = String::new();
    for record in pagination.slice(records) {
        rows.push_str(&format!(
            r#"
        <tr>
            <td>{}</td>
            <td><a href="{}" target="_blank" rel="noopener noreferrer">View file</a></td>
            <td>{}</td>
        </tr>
        "#,
            html_escape(&record.display_name),
            html_escape(&record.remote_link),
            format_date(record),
        ));
    }

    format!(
        r#"
    <section id="history" data-page="{}" hidden>
        <h2>Upload history</h2>
        <table class="file-listing">
            <thead>
                <tr>
                    <th>Game</th>
                    <th>Google Drive link</th>
                    <th>Upload date</th>
                </tr>
            </thead>
            <tbody>
                {}
            </tbody>
        </table>
        {}
    </section>
    "#,
        pagination.current_page(),
        rows,
        pagination_nav(pagination)
    )
}

/// Previous / numbered / Next controls. Empty when everything fits on one page.
pub fn pagination_nav(pagination: &Pagination) -> String {
    if pagination.total_pages() <= 1 {
        return String::new();
    }

    let current = pagination.current_page();
    let mut nav = String::new();

    if pagination.has_previous() {
        nav.push_str(&format!(
            r#"<a href="/?page={0}" data-page="{0}" class="page-link">&laquo; Previous</a> "#,
            current - 1
        ));
    } else {
        nav.push_str(r#"<span class="page-link disabled">&laquo; Previous</span> "#);
    }

    for token in pagination.window() {
        match token {
            PageToken::Page(n) if n == current => {
                nav.push_str(&format!(r#"<span class="page-current">{}</span> "#, n));
            }
            PageToken::Page(n) => {
                nav.push_str(&format!(
                    r#"<a href="/?page={0}" data-page="{0}" class="page-link">{0}</a> "#,
                    n
                ));
            }
            PageToken::Ellipsis => {
                nav.push_str(&format!(r#"<span class="page-gap">{}</span> "#, token));
            }
        }
    }

    if pagination.has_next() {
        nav.push_str(&format!(
            r#"<a href="/?page={0}" data-page="{0}" class="page-link">Next &raquo;</a>"#,
            current + 1
        ));
    } else {
        nav.push_str(r#"<span class="page-link disabled">Next &raquo;</span>"#);
    }

    format!(r#"<nav class="pagination">{}</nav>"#, nav)
}

fn format_date(record: &UploadRecord) -> String {
    record.uploaded_at.format("%-d %B %Y").to_string()
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Browser side of the upload flow.
const UPLOAD_SCRIPT: &str = r#"
(function () {
    const app = document.getElementById('app');
    const clientId = app.dataset.clientId;
    const loginButton = document.getElementById('login-button');
    const loginStatus = document.getElementById('login-status');
    const uploadSection = document.getElementById('upload-section');
    const dropzone = document.getElementById('dropzone');
    const fileInput = document.getElementById('file-input');
    const queue = document.getElementById('queue');
    const queueList = document.getElementById('queue-list');
    const uploadButton = document.getElementById('upload-button');

    let accessToken = sessionStorage.getItem('gamedrop-token');
    let historyPage = Number(new URLSearchParams(window.location.search).get('page')) || 1;
    let uploading = false;
    let items = [];
    let nextId = 0;

    function showLoggedIn() {
        loginButton.hidden = true;
        loginStatus.hidden = false;
        uploadSection.hidden = false;
        const history = document.getElementById('history');
        if (history && history.querySelector('table')) history.hidden = false;
    }

    loginButton.addEventListener('click', function () {
        if (!window.google || !clientId) {
            alert('Google login is not available.');
            return;
        }
        const tokenClient = google.accounts.oauth2.initTokenClient({
            client_id: clientId,
            scope: 'https://www.googleapis.com/auth/drive.file',
            callback: function (response) {
                if (response.error || !response.access_token) {
                    alert('Login failed');
                    return;
                }
                accessToken = response.access_token;
                sessionStorage.setItem('gamedrop-token', accessToken);
                showLoggedIn();
            },
        });
        tokenClient.requestAccessToken();
    });

    function addFiles(files) {
        for (const file of files) {
            if (!file.name.toLowerCase().endsWith('.zip')) continue;
            items.push({ id: 'f' + (nextId++), file: file, status: 'pending', message: null });
        }
        render();
    }

    function setStatus(item, status, message) {
        item.status = status;
        item.message = message;
        render();
    }

    function label(item) {
        if (item.message) return item.message;
        return item.status.charAt(0).toUpperCase() + item.status.slice(1);
    }

    function render() {
        queue.hidden = items.length === 0;
        queueList.innerHTML = '';
        for (const item of items) {
            const li = document.createElement('li');
            li.className = 'queue-item status-' + item.status;
            const name = document.createElement('span');
            name.className = 'queue-name';
            name.textContent = item.file.name;
            const status = document.createElement('span');
            status.className = 'queue-status';
            status.textContent = label(item);
            const remove = document.createElement('button');
            remove.className = 'queue-remove';
            remove.innerHTML = '&times;';
            remove.disabled = uploading;
            remove.addEventListener('click', function () {
                if (uploading) return;
                items = items.filter(function (i) { return i.id !== item.id; });
                render();
            });
            li.append(name, status, remove);
            queueList.appendChild(li);
        }
        const pending = items.filter(function (i) { return i.status === 'pending'; }).length;
        uploadButton.textContent = uploading ? 'Processing...' : 'Upload ' + pending + ' files';
        uploadButton.disabled = uploading || items.length === 0;
    }

    async function loadHistory(page) {
        try {
            const res = await fetch('/?page=' + page);
            if (!res.ok) return;
            const doc = new DOMParser().parseFromString(await res.text(), 'text/html');
            const fresh = doc.getElementById('history');
            const current = document.getElementById('history');
            if (fresh && current) {
                current.replaceWith(fresh);
                if (fresh.querySelector('table') && accessToken) fresh.hidden = false;
                historyPage = Number(fresh.dataset.page) || 1;
                window.history.replaceState(null, '', '/?page=' + historyPage);
            }
        } catch (e) {
            console.error('Failed to load history:', e);
        }
    }

    function refreshHistory() {
        return loadHistory(historyPage);
    }

    document.addEventListener('click', function (e) {
        const link = e.target.closest('#history a[data-page]');
        if (!link) return;
        e.preventDefault();
        loadHistory(Number(link.dataset.page));
    });

    async function uploadAll() {
        if (items.length === 0) return;
        if (!accessToken) {
            alert('You must log in first.');
            return;
        }
        uploading = true;
        render();
        for (const item of items) {
            if (item.status !== 'pending') continue;
            setStatus(item, 'uploading', 'Sending...');
            const form = new FormData();
            form.append('file', item.file);
            try {
                const res = await fetch('/api/upload', {
                    method: 'POST',
                    headers: { Authorization: 'Bearer ' + accessToken },
                    body: form,
                });
                const result = await res.json().catch(function () { return {}; });
                if (res.status === 201) {
                    setStatus(item, 'success', 'Uploaded');
                } else if (res.status === 409) {
                    setStatus(item, 'skipped', 'Skipped (already exists)');
                } else {
                    throw new Error(result.error || 'Upload failed');
                }
            } catch (e) {
                setStatus(item, 'error', 'Failed: ' + e.message);
            }
        }
        uploading = false;
        render();
        refreshHistory();
    }

    dropzone.addEventListener('click', function () { fileInput.click(); });
    fileInput.addEventListener('change', function () {
        addFiles(fileInput.files);
        fileInput.value = '';
    });
    dropzone.addEventListener('dragover', function (e) {
        e.preventDefault();
        dropzone.classList.add('active');
    });
    dropzone.addEventListener('dragleave', function () { dropzone.classList.remove('active'); });
    dropzone.addEventListener('drop', function (e) {
        e.preventDefault();
        dropzone.classList.remove('active');
        addFiles(e.dataTransfer.files);
    });
    uploadButton.addEventListener('click', uploadAll);

    if (accessToken) showLoggedIn();
    render();
})();
"#;

/// CSS styles for the web interface - minimal text-based design.
pub const CSS: &str = r#"
:root {
    --bg: #fff;
    --text: #222;
    --text-muted: #666;
    --link: #0066cc;
    --link-hover: #004499;
    --border: #ccc;
    --highlight: #fffbcc;
    --ok: #2e7d32;
    --warn: #9a6700;
    --fail: #c62828;
}

@media (prefers-color-scheme: dark) {
    :root {
        --bg: #1a1a1a;
        --text: #e0e0e0;
        --text-muted: #888;
        --link: #6ab0ff;
        --link-hover: #8dc4ff;
        --border: #444;
        --highlight: #3a3520;
        --ok: #81c784;
        --warn: #e3b341;
        --fail: #ef9a9a;
    }
}

* { box-sizing: border-box; margin: 0; padding: 0; }

body {
    font-family: 'Lucida Console', 'Courier New', monospace;
    font-size: 14px;
    background: var(--bg);
    color: var(--text);
    line-height: 1.5;
}

a { color: var(--link); text-decoration: none; }
a:hover { color: var(--link-hover); text-decoration: underline; }

main { max-width: 960px; margin: 0 auto; padding: 1rem; }

#main-header { text-align: center; margin-bottom: 2rem; }
#main-header h1 { font-size: 20px; margin-bottom: 1rem; }

.btn {
    padding: 0.4rem 1rem;
    border: 1px solid var(--border);
    background: var(--bg);
    color: var(--link);
    font: inherit;
    cursor: pointer;
}
.btn:disabled { opacity: 0.5; cursor: not-allowed; }
.btn-wide { width: 100%; margin-top: 1rem; }

#upload-section { max-width: 560px; margin: 0 auto 2rem; }

.dropzone {
    border: 2px dashed var(--border);
    padding: 2.5rem 1rem;
    text-align: center;
    color: var(--text-muted);
    cursor: pointer;
}
.dropzone.active, .dropzone:hover { border-color: var(--link); background: var(--highlight); }

#queue { margin-top: 1rem; }
#queue-list { list-style: none; max-height: 15rem; overflow-y: auto; }
.queue-item {
    display: flex;
    justify-content: space-between;
    align-items: center;
    gap: 0.5rem;
    padding: 0.25rem 0.5rem;
    border-bottom: 1px solid var(--border);
}
.queue-name { overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.queue-status { font-size: 12px; color: var(--text-muted); margin-left: auto; }
.status-uploading .queue-status { color: var(--link); }
.status-success .queue-status { color: var(--ok); }
.status-skipped .queue-status { color: var(--warn); }
.status-error .queue-status { color: var(--fail); }
.queue-remove { border: none; background: none; color: var(--text-muted); cursor: pointer; font: inherit; }
.queue-remove:disabled { opacity: 0.5; }

#history h2 { font-size: 16px; text-align: center; margin-bottom: 1rem; }

.file-listing { width: 100%; border-collapse: collapse; }
.file-listing th, .file-listing td {
    text-align: left;
    padding: 0.35rem 0.75rem;
    border-bottom: 1px solid var(--border);
}
.file-listing th { font-size: 12px; color: var(--text-muted); text-transform: uppercase; }

.pagination {
    display: flex;
    gap: 0.25rem;
    align-items: center;
    justify-content: center;
    margin: 1rem 0;
    font-size: 13px;
}

.page-link {
    padding: 0.35rem 0.75rem;
    border: 1px solid var(--border);
    text-decoration: none;
    color: var(--link);
}

.page-link:hover {
    background: var(--highlight);
    text-decoration: none;
}

.page-link.disabled { color: var(--text-muted); opacity: 0.5; }

.page-current {
    padding: 0.35rem 0.75rem;
    border: 1px solid var(--link);
    background: var(--link);
    color: var(--bg);
}

.page-gap { padding: 0.35rem 0.5rem; color: var(--text-muted); }
"#;
