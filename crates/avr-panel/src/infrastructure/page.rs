//! Server-rendered button page.
//!
//! The page is generated from the command table: one section per
//! [`CommandGroup`], one button per command, in table order. A small inline
//! script wires the buttons to `POST /api/command/{name}`, keeps a custom
//! command box pointed at `POST /api/command`, and mirrors `/ws/state`
//! pushes into the status bar.
//!
//! No template engine: the page is one document with a handful of repeated
//! elements, built with plain string pushes.

use avr_core::CommandTable;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>DiscoAVR</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 720px; padding: 1rem; background: #14161a; color: #e8e8e8; }
  h1 { font-size: 1.4rem; }
  h2 { font-size: 1rem; margin: 1.2rem 0 0.4rem; color: #9ab; }
  #status { padding: 0.5rem 0.8rem; border-radius: 6px; background: #22262c; margin-bottom: 0.6rem; }
  #status.connected { background: #15331b; }
  .group { display: flex; flex-wrap: wrap; gap: 0.4rem; }
  button { padding: 0.7rem 1.1rem; font-size: 1rem; border: none; border-radius: 6px; background: #2d6cdf; color: white; cursor: pointer; }
  button:active { background: #1d4fa8; }
  button.util { background: #444a52; }
  #custom { margin-top: 1.4rem; display: flex; gap: 0.4rem; }
  #custom input { flex: 1; padding: 0.6rem; border-radius: 6px; border: 1px solid #444; background: #1b1e23; color: #e8e8e8; }
  #response { margin-top: 0.6rem; font-family: monospace; font-size: 0.85rem; color: #8a9; min-height: 1.2em; }
</style>
</head>
<body>
<h1>DiscoAVR</h1>
<div id="status">connecting&hellip;</div>
<div class="group">
  <button class="util" onclick="call('/api/connect')">Connect</button>
  <button class="util" onclick="call('/api/disconnect')">Disconnect</button>
</div>
"#;

const PAGE_SCRIPT: &str = r#"<div id="custom">
  <input id="custom-cmd" placeholder="Custom command, e.g. MV55" autocomplete="off">
  <button class="util" onclick="sendCustom()">Send</button>
</div>
<div id="response"></div>
<script>
const statusEl = document.getElementById('status');
const responseEl = document.getElementById('response');

function showState(connected, state) {
  statusEl.classList.toggle('connected', connected);
  if (!connected) { statusEl.textContent = 'disconnected'; return; }
  const parts = [];
  if (state.power !== null) parts.push(state.power ? 'on' : 'standby');
  if (state.volume !== null) parts.push('vol ' + state.volume);
  if (state.muted) parts.push('muted');
  if (state.input_source !== null) parts.push(state.input_source);
  if (state.surround_mode !== null) parts.push(state.surround_mode);
  if (state.zone2_volume !== null) parts.push('z2 ' + state.zone2_volume + (state.zone2_muted ? ' muted' : ''));
  statusEl.textContent = 'connected' + (parts.length ? ' · ' + parts.join(' · ') : '');
}

async function call(url, body) {
  const opts = { method: 'POST' };
  if (body !== undefined) {
    opts.headers = { 'Content-Type': 'application/json' };
    opts.body = JSON.stringify(body);
  }
  const data = await (await fetch(url, opts)).json();
  responseEl.textContent = data.error ? ('error: ' + data.error) : (data.response || '');
  if (data.state !== undefined) showState(data.connected, data.state);
  return data;
}

function press(name) { call('/api/command/' + name); }

function sendCustom() {
  const input = document.getElementById('custom-cmd');
  if (input.value.trim()) call('/api/command', { command: input.value.trim() });
}

function attach() {
  const ws = new WebSocket((location.protocol === 'https:' ? 'wss://' : 'ws://') + location.host + '/ws/state');
  ws.onmessage = (ev) => {
    const msg = JSON.parse(ev.data);
    if (msg.type === 'state_update') showState(msg.connected, msg.state);
  };
  const ping = setInterval(() => { if (ws.readyState === 1) ws.send(JSON.stringify({ type: 'ping' })); }, 30000);
  ws.onclose = () => { clearInterval(ping); setTimeout(attach, 2000); };
}
attach();
</script>
</body>
</html>
"#;

/// Renders the full index page for the given command table.
pub fn render_index(table: &CommandTable) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str(PAGE_HEAD);

    for group in table.groups() {
        html.push_str(&format!("<h2>{}</h2>\n<div class=\"group\">\n", group.title));
        for name in group.commands {
            if let Some(spec) = table.lookup(name) {
                html.push_str(&format!(
                    "  <button onclick=\"press('{}')\">{}</button>\n",
                    spec.name, spec.label
                ));
            }
        }
        html.push_str("</div>\n");
    }

    html.push_str(PAGE_SCRIPT);
    html
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_contains_every_grouped_button() {
        let table = CommandTable::standard();
        let html = render_index(&table);
        for group in table.groups() {
            assert!(html.contains(group.title), "missing section {:?}", group.title);
            for name in group.commands {
                assert!(
                    html.contains(&format!("press('{name}')")),
                    "missing button for {name:?}"
                );
            }
        }
    }

    #[test]
    fn test_page_omits_api_only_commands() {
        let html = render_index(&CommandTable::standard());
        assert!(!html.contains("press('input_phono')"));
    }

    #[test]
    fn test_page_wires_push_channel_and_custom_box() {
        let html = render_index(&CommandTable::standard());
        assert!(html.contains("/ws/state"));
        assert!(html.contains("/api/command"));
        assert!(html.contains("custom-cmd"));
    }

    #[test]
    fn test_page_is_a_complete_document() {
        let html = render_index(&CommandTable::standard());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
