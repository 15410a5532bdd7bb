//! Canned local HTTP server for exercising `ApiClient` end to end

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::ApiClient;
use crate::account::TokenStore;
use crate::app::ApiConfig;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// e.g. `GET /client/avatars HTTP/1.1`
    pub line: String,
    pub authorization: Option<String>,
    pub body: String,
}

pub struct CannedServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl CannedServer {
    /// Serve one `(status, body)` per incoming connection, in order
    pub async fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("local addr should resolve");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&requests);

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let request = read_request(&mut stream).await;
                captured.lock().push(request);

                let response = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().clone()
    }

    /// Client pointed at this server, sharing `tokens`
    pub fn client(&self, tokens: Arc<Mutex<TokenStore>>) -> ApiClient {
        let config = ApiConfig {
            base_url: self.base_url.clone(),
            timeout_secs: 5,
        };
        ApiClient::new(&config, tokens).expect("client should build")
    }
}

async fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let read = stream.read(&mut chunk).await.unwrap_or(0);
        if read == 0 {
            break buf.len();
        }
        buf.extend_from_slice(&chunk[..read]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let line = lines.next().unwrap_or_default().to_string();

    let mut content_length = 0;
    let mut authorization = None;
    for header in lines {
        if let Some((name, value)) = header.split_once(':') {
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            } else if name.eq_ignore_ascii_case("authorization") {
                authorization = Some(value.to_string());
            }
        }
    }

    let mut body = buf.get(header_end + 4..).map(<[u8]>::to_vec).unwrap_or_default();
    while body.len() < content_length {
        let read = stream.read(&mut chunk).await.unwrap_or(0);
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    CapturedRequest {
        line,
        authorization,
        body: String::from_utf8_lossy(&body).to_string(),
    }
}
