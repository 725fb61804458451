// src/server/livereload.rs

//! Websocket endpoint, browser client and HTML injection for live reload.

use axum::body::{to_bytes, Body};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::context::ReloadHub;

pub const SOCKET_PATH: &str = "/__assetdag/livereload";
pub const CLIENT_PATH: &str = "/__assetdag/livereload.js";

/// Tag added to every served HTML page.
pub const SCRIPT_TAG: &str = r#"<script src="/__assetdag/livereload.js"></script>"#;

/// Text frame sent for each reload signal.
pub const RELOAD_MESSAGE: &str = "reload";

const CLIENT_JS: &str = r#"(function () {
  var proto = location.protocol === "https:" ? "wss:" : "ws:";
  function connect() {
    var ws = new WebSocket(proto + "//" + location.host + "/__assetdag/livereload");
    ws.onmessage = function (ev) {
      if (ev.data === "reload") location.reload();
    };
    ws.onclose = function () {
      setTimeout(connect, 1000);
    };
  }
  connect();
})();
"#;

pub async fn client_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        CLIENT_JS,
    )
}

/// Subscribe before the upgrade completes so no signal sent after the
/// handshake is missed.
pub async fn socket(ws: WebSocketUpgrade, State(hub): State<ReloadHub>) -> Response {
    let rx = hub.subscribe();
    ws.on_upgrade(move |socket| session(socket, rx))
}

async fn session(mut socket: WebSocket, mut rx: broadcast::Receiver<()>) {
    debug!("live-reload client connected");
    loop {
        tokio::select! {
            signal = rx.recv() => match signal {
                Ok(()) | Err(RecvError::Lagged(_)) => {
                    if socket.send(Message::Text(RELOAD_MESSAGE.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("live-reload client disconnected");
}

/// Insert [`SCRIPT_TAG`] before the last `</body>`, or append it.
pub fn inject_script(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + SCRIPT_TAG.len());
            out.push_str(&html[..idx]);
            out.push_str(SCRIPT_TAG);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{SCRIPT_TAG}"),
    }
}

fn is_html(res: &Response) -> bool {
    res.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"))
}

/// Middleware rewriting successful HTML responses to load the client.
pub async fn inject_middleware(req: Request, next: Next) -> Response {
    let res = next.run(req).await;
    if res.status() != StatusCode::OK || !is_html(&res) {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("could not buffer HTML response: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = inject_script(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::ETAG);
    if let Ok(len) = HeaderValue::from_str(&html.len().to_string()) {
        parts.headers.insert(header::CONTENT_LENGTH, len);
    }
    Response::from_parts(parts, Body::from(html))
}
