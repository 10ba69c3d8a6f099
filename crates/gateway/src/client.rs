use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::debug;

use lockerhub_protocol::{ChannelCommandAck, ChannelStatusReport};

/// Characters that cannot appear raw in a URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'#')
    .add(b'/')
    .add(b'%');

/// Errors from the channel gateway client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid API token")]
    InvalidToken,
}

/// Client for the per-branch channel routes of the locker backend.
#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a new client against the given API base URL.
    ///
    /// When `token` is set it is sent as a Bearer `Authorization` header on
    /// every request.
    pub fn new(base_url: impl Into<String>, token: Option<&str>) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| Error::InvalidToken)?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetches the current channel status for a branch.
    pub async fn status(&self, branch_id: &str) -> Result<ChannelStatusReport, Error> {
        let body = self
            .send(Method::GET, &channel_path(branch_id, "status"))
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Asks the gateway to bring up the branch's channel.
    ///
    /// The acknowledgement says nothing about the outcome; the status route
    /// must be polled afterwards.
    pub async fn connect(&self, branch_id: &str) -> Result<ChannelCommandAck, Error> {
        let body = self
            .send(Method::POST, &channel_path(branch_id, "connect"))
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Asks the gateway to tear down the branch's channel.
    pub async fn disconnect(&self, branch_id: &str) -> Result<ChannelCommandAck, Error> {
        let body = self
            .send(Method::POST, &channel_path(branch_id, "disconnect"))
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Deletes the branch's stored session, forcing a fresh pairing on the
    /// next connect.
    pub async fn clear_session(&self, branch_id: &str) -> Result<ChannelCommandAck, Error> {
        let body = self
            .send(Method::DELETE, &channel_path(branch_id, "session/clear"))
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Performs a request and maps non-2xx responses to [`Error::Api`].
    async fn send(&self, method: Method, path: &str) -> Result<Vec<u8>, Error> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "gateway request");
        let resp = self.http.request(method, &url).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.bytes().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

/// Builds the route for a branch's channel operation, encoding the id.
fn channel_path(branch_id: &str, leaf: &str) -> String {
    let id = utf8_percent_encode(branch_id, SEGMENT);
    format!("/branches/{id}/whatsapp/{leaf}")
}

/// Structured error body the backend sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Pulls a human-readable message out of an error response body.
///
/// Prefers the structured `message`/`error` fields, falls back to the raw
/// body text, and to a generic message when the body is empty.
fn extract_error_message(body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body)
        && let Some(message) = parsed.message.or(parsed.error)
    {
        return message;
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        "request failed".into()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockerhub_protocol::ChannelStatus;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Starts a one-shot mock HTTP server. The handle resolves to the
    /// request line (`"GET /path HTTP/1.1"`) once a request was served.
    async fn mock_server(status: u16, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let mut request_line = String::new();
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let head = String::from_utf8_lossy(&buf[..n]);
                request_line = head.lines().next().unwrap_or_default().to_string();

                let resp = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
            request_line
        });

        (url, handle)
    }

    #[tokio::test]
    async fn status_hits_status_route() {
        let json = r#"{"status":"qr_pending","qrCode":"iVBORw0KGgo="}"#;
        let (url, handle) = mock_server(200, json).await;

        let client = Client::new(url, None).unwrap();
        let report = client.status("loja-centro").await.unwrap();

        assert_eq!(report.status, ChannelStatus::QrPending);
        assert_eq!(report.qr_code.as_deref(), Some("iVBORw0KGgo="));
        assert_eq!(
            handle.await.unwrap(),
            "GET /branches/loja-centro/whatsapp/status HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn connect_posts_to_connect_route() {
        let (url, handle) = mock_server(200, r#"{"message":"connection started"}"#).await;

        let client = Client::new(url, None).unwrap();
        let ack = client.connect("loja-centro").await.unwrap();

        assert_eq!(ack.message, "connection started");
        assert_eq!(
            handle.await.unwrap(),
            "POST /branches/loja-centro/whatsapp/connect HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn disconnect_posts_to_disconnect_route() {
        let (url, handle) = mock_server(200, r#"{"message":"disconnected"}"#).await;

        let client = Client::new(url, None).unwrap();
        client.disconnect("loja-centro").await.unwrap();

        assert_eq!(
            handle.await.unwrap(),
            "POST /branches/loja-centro/whatsapp/disconnect HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn clear_session_uses_delete() {
        let (url, handle) = mock_server(200, r#"{"message":"session cleared"}"#).await;

        let client = Client::new(url, None).unwrap();
        client.clear_session("loja-centro").await.unwrap();

        assert_eq!(
            handle.await.unwrap(),
            "DELETE /branches/loja-centro/whatsapp/session/clear HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn non_2xx_extracts_structured_message() {
        let (url, _handle) = mock_server(502, r#"{"error":"gateway worker offline"}"#).await;

        let client = Client::new(url, None).unwrap();
        let err = client.status("loja-centro").await.unwrap_err();

        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "gateway worker offline");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_maps_to_http_error() {
        // Bind-then-drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
        drop(listener);

        let client = Client::new(url, None).unwrap();
        let err = client.status("loja-centro").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[test]
    fn new_accepts_token() {
        assert!(Client::new("http://localhost:3000/api", Some("tok-123")).is_ok());
    }

    #[test]
    fn new_rejects_token_with_control_chars() {
        let err = Client::new("http://localhost:3000/api", Some("bad\ntoken")).unwrap_err();
        assert!(matches!(err, Error::InvalidToken));
    }

    #[test]
    fn channel_path_encodes_branch_id() {
        assert_eq!(
            channel_path("loja-1", "status"),
            "/branches/loja-1/whatsapp/status"
        );
        assert_eq!(
            channel_path("loja 1", "connect"),
            "/branches/loja%201/whatsapp/connect"
        );
        assert_eq!(
            channel_path("a/b", "status"),
            "/branches/a%2Fb/whatsapp/status"
        );
    }

    #[test]
    fn extract_error_message_variants() {
        assert_eq!(
            extract_error_message(br#"{"message":"invalid branch"}"#),
            "invalid branch"
        );
        assert_eq!(
            extract_error_message(br#"{"error":"boom"}"#),
            "boom"
        );
        assert_eq!(extract_error_message(b"plain text failure"), "plain text failure");
        assert_eq!(extract_error_message(b""), "request failed");
        assert_eq!(extract_error_message(b"  \n "), "request failed");
    }
}
