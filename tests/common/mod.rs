//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use site_server::config::SiteConfig;
use site_server::http::HttpServer;
use site_server::lifecycle::Shutdown;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// A request as seen by a mock backend.
#[derive(Debug, Clone, Default)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Canned reply of a mock backend: status, content type, body.
pub type MockReply = (u16, &'static str, String);

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

async fn read_request<R>(reader: &mut BufReader<R>) -> Option<CapturedRequest>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    reader.read_line(&mut line).await.ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            let (k, v) = (k.trim().to_string(), v.trim().to_string());
            if k.eq_ignore_ascii_case("content-length") {
                content_length = v.parse().unwrap_or(0);
            }
            headers.push((k, v));
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await.ok()?;
    Some(CapturedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Start a programmable mock backend. Every request is recorded and
/// answered with whatever `f` returns.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(
    addr: SocketAddr,
    f: F,
) -> Arc<Mutex<Vec<CapturedRequest>>>
where
    F: Fn(CapturedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockReply> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let mut reader = BufReader::new(socket);
                        let Some(request) = read_request(&mut reader).await else {
                            return;
                        };
                        recorded.lock().unwrap().push(request.clone());
                        let (status, content_type, body) = f(request).await;

                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            reason(status),
                            content_type,
                            body.len(),
                            body
                        );
                        let mut socket = reader.into_inner();
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    seen
}

/// A static root holding the site's pages.
#[allow(dead_code)]
pub fn static_site() -> TempDir {
    let dir = TempDir::new().unwrap();
    let pages = [
        ("index.html", "<h1>home</h1>"),
        ("404.html", "<h1>not here</h1>"),
        ("android_privacy.html", "android privacy"),
        ("ios_privacy.html", "ios privacy"),
        ("terms_of_use.html", "terms of use"),
        ("downloads.html", "downloads"),
    ];
    for (name, body) in pages {
        std::fs::write(dir.path().join(name), body).unwrap();
    }
    std::fs::create_dir(dir.path().join("css")).unwrap();
    std::fs::write(dir.path().join("css/site.css"), "body { margin: 0 }").unwrap();
    dir
}

/// Config serving `root` on `addr`, with insecure crumb cookies for plain HTTP.
#[allow(dead_code)]
pub fn site_config(addr: SocketAddr, root: &std::path::Path) -> SiteConfig {
    let mut config = SiteConfig::default();
    config.listener.host = addr.ip().to_string();
    config.listener.port = addr.port();
    config.static_files.root = root.to_path_buf();
    config.csrf.secure_cookie = false;
    config
}

/// Run `server` on `addr` until the returned handle is triggered.
#[allow(dead_code)]
pub async fn start_server(addr: SocketAddr, server: HttpServer) -> Shutdown {
    let shutdown = Shutdown::new();
    let listener = TcpListener::bind(addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown
}

/// Client that neither follows redirects nor pools connections.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
