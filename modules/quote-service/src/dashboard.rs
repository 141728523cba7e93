//! Dashboard HTML page handler.
//!
//! Serves a self-contained page that renders the current view: the
//! highlighted quote, the category filter, the visible list and the last
//! sync notification. All actions post to the RPC routes and reload.

use crate::routes::AppState;
use crate::store::lock_store;
use crate::view;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use quote_types::Quote;
use std::sync::{Arc, PoisonError};

pub async fn dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let last_sync = state.sync.last_sync.lock().await.clone();
    let current = {
        let store = lock_store(&state.store);
        let mut rng = state.rng.lock().unwrap_or_else(PoisonError::into_inner);
        view::current_view(&store, rng.as_mut())
    };
    let uptime = state.start_time.elapsed().as_secs();

    let highlight_html = match (&current.highlight, &current.empty_message) {
        (Some(q), _) => format!(
            "<blockquote>&ldquo;{}&rdquo; <span class=\"cat\">({})</span></blockquote>",
            escape_html(&q.text),
            escape_html(&q.category)
        ),
        (None, Some(msg)) => format!("<p class=\"empty\">{}</p>", escape_html(msg)),
        (None, None) => String::new(),
    };

    let mut options = format!(
        "<option value=\"all\"{}>All Categories</option>",
        selected_attr(&current.selection, quote_types::ALL_CATEGORIES)
    );
    for cat in &current.categories {
        options.push_str(&format!(
            "<option value=\"{0}\"{1}>{0}</option>",
            escape_html(cat),
            selected_attr(&current.selection, cat)
        ));
    }

    let rows = render_rows(&current.visible, current.empty_message.as_deref());

    let sync_str = last_sync
        .map(|r| format!("{} ({})", escape_html(&r.message), r.finished_at))
        .unwrap_or_else(|| "not yet".to_string());

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Quote Generator</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0f1117; color: #e0e0e0; padding: 20px; }}
  h1 {{ color: #58a6ff; margin-bottom: 8px; }}
  h2 {{ color: #c9d1d9; margin-bottom: 12px; font-size: 1.1em; }}
  .meta {{ color: #8b949e; font-size: 0.85em; margin-bottom: 20px; }}
  blockquote {{ background: #161b22; border-left: 4px solid #58a6ff; padding: 16px 20px; margin-bottom: 20px; font-size: 1.2em; }}
  .cat {{ color: #8b949e; font-size: 0.8em; }}
  .empty {{ color: #8b949e; margin-bottom: 20px; }}
  .section {{ margin-bottom: 28px; }}
  .controls {{ display: flex; gap: 8px; flex-wrap: wrap; margin-bottom: 16px; }}
  input, select, button, textarea {{ background: #161b22; color: #e0e0e0; border: 1px solid #30363d; border-radius: 6px; padding: 6px 10px; }}
  button {{ cursor: pointer; }}
  button:hover {{ border-color: #58a6ff; }}
  table {{ width: 100%; border-collapse: collapse; margin-bottom: 24px; }}
  th {{ background: #161b22; color: #8b949e; text-align: left; padding: 8px 12px; font-size: 0.85em; text-transform: uppercase; border-bottom: 1px solid #30363d; }}
  td {{ padding: 8px 12px; border-bottom: 1px solid #21262d; font-size: 0.9em; }}
  tr:hover {{ background: #161b22; }}
  .mono {{ font-family: 'SF Mono', 'Consolas', monospace; font-size: 0.85em; }}
  a {{ color: #58a6ff; text-decoration: none; }}
</style>
</head>
<body>
  <h1>Quote Generator</h1>
  <p class="meta">Uptime: {uptime} &middot; Last sync: {sync_str} &middot; Sync interval: {interval}s</p>

  {highlight_html}

  <div class="controls">
    <button onclick="rpc('/rpc/quotes/random', {{}})">Show New Quote</button>
    <select onchange="rpc('/rpc/selection/change', {{selection: this.value}})">{options}</select>
    <button onclick="rpc('/rpc/sync/run', {{}})">Sync Now</button>
    <a href="/rpc/transfer/export"><button>Export JSON</button></a>
    <input type="file" accept=".json,application/json" onchange="importFile(this)">
  </div>

  <div class="section">
    <h2>Add Quote</h2>
    <div class="controls">
      <input id="newQuoteText" placeholder="Enter a new quote" size="50">
      <input id="newQuoteCategory" placeholder="Enter quote category">
      <button onclick="rpc('/rpc/quotes/add', {{text: newQuoteText.value, category: newQuoteCategory.value}})">Add Quote</button>
    </div>
  </div>

  <div class="section">
    <h2>Quotes ({count})</h2>
    <table>
      <thead><tr><th>Text</th><th>Category</th><th>ID</th><th></th></tr></thead>
      <tbody>{rows}</tbody>
    </table>
  </div>

  <script>
    async function rpc(path, body) {{
      const res = await fetch(path, {{ method: 'POST', headers: {{ 'Content-Type': 'application/json' }}, body: JSON.stringify(body) }});
      const json = await res.json().catch(() => ({{}}));
      if (!json.success && json.error) alert(json.error);
      location.reload();
    }}
    function importFile(input) {{
      if (!input.files.length) return;
      const reader = new FileReader();
      reader.onload = e => rpc('/rpc/transfer/import', {{ document: e.target.result }});
      reader.readAsText(input.files[0]);
    }}
    setTimeout(() => location.reload(), 30000);
  </script>
</body>
</html>"#,
        uptime = format_uptime(uptime),
        sync_str = sync_str,
        interval = state.sync_interval_secs,
        highlight_html = highlight_html,
        options = options,
        count = current.visible.len(),
        rows = rows,
    );

    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
}

/// Table rows for the visible quotes. Ids travel to the delete handler
/// through an escaped `data-id` attribute, never through inline script.
fn render_rows(visible: &[Quote], empty_message: Option<&str>) -> String {
    let mut rows = String::new();
    for q in visible {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"mono\">{}</td>\
             <td><button data-id=\"{}\" onclick=\"rpc('/rpc/quotes/remove', {{id: this.dataset.id}})\">Delete</button></td></tr>\n",
            escape_html(&q.text),
            escape_html(&q.category),
            escape_html(&q.id),
            escape_html(&q.id)
        ));
    }
    if rows.is_empty() {
        rows = format!(
            "<tr><td colspan=\"4\">{}</td></tr>",
            escape_html(empty_message.unwrap_or(view::EMPTY_STORE_MESSAGE))
        );
    }
    rows
}

fn selected_attr(selection: &str, value: &str) -> &'static str {
    if selection == value { " selected" } else { "" }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"a&b\"</b>"), "&lt;b&gt;&quot;a&amp;b&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_rows_keep_hostile_ids_out_of_script() {
        let hostile = Quote {
            id: "&#39;);alert(1);//".to_string(),
            text: "<img src=x>".to_string(),
            category: "c".to_string(),
            updated_at: 1,
        };
        let out = render_rows(&[hostile], None);
        assert!(!out.contains("&#39;"));
        assert!(!out.contains("<img"));
        assert!(out.contains("data-id=\"&amp;#39;);alert(1);//\""));
        assert!(out.contains("{id: this.dataset.id}"));
    }

    #[test]
    fn test_rows_show_empty_message() {
        let out = render_rows(&[], Some(view::EMPTY_CATEGORY_MESSAGE));
        assert!(out.contains("No quotes for this category."));
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(5), "5s");
        assert_eq!(format_uptime(65), "1m 5s");
        assert_eq!(format_uptime(3725), "1h 2m 5s");
    }
}
