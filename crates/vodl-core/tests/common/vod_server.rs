//! Minimal HTTP/1.1 server for integration tests: serves a VOD manifest and
//! its segments from memory.
//!
//! Paths registered with a failure count answer `503` that many times before
//! serving their body. Unknown paths answer `404`.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct Route {
    body: Vec<u8>,
    failures_left: AtomicU32,
}

/// Routes to serve, keyed by absolute path (e.g. `/vod/chunked/index-dvr.m3u8`).
#[derive(Default)]
pub struct VodServerBuilder {
    routes: HashMap<String, Route>,
}

impl VodServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(
            path.to_string(),
            Route {
                body: body.into(),
                failures_left: AtomicU32::new(0),
            },
        );
        self
    }

    /// Like `route`, but the first `failures` requests get a 503.
    pub fn flaky_route(mut self, path: &str, body: impl Into<Vec<u8>>, failures: u32) -> Self {
        self.routes.insert(
            path.to_string(),
            Route {
                body: body.into(),
                failures_left: AtomicU32::new(failures),
            },
        );
        self
    }

    /// Starts the server on a background thread. It runs until the process exits.
    pub fn start(self) -> VodServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let routes = Arc::new(self.routes);
        let hits = Arc::new(Mutex::new(HashMap::new()));
        {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&hits);
            thread::spawn(move || {
                for stream in listener.incoming().flatten() {
                    let routes = Arc::clone(&routes);
                    let hits = Arc::clone(&hits);
                    thread::spawn(move || handle(stream, &routes, &hits));
                }
            });
        }
        VodServer {
            base: format!("http://127.0.0.1:{}", port),
            hits,
        }
    }
}

pub struct VodServer {
    /// e.g. "http://127.0.0.1:12345", no trailing slash.
    pub base: String,
    hits: Arc<Mutex<HashMap<String, u32>>>,
}

impl VodServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Number of GET requests seen for `path`.
    pub fn hits(&self, path: &str) -> u32 {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

fn handle(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    hits: &Mutex<HashMap<String, u32>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/");
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    *hits.lock().unwrap().entry(path.to_string()).or_insert(0) += 1;

    let Some(route) = routes.get(path) else {
        let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
        return;
    };
    let failing = route
        .failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        let _ = stream
            .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        route.body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&route.body);
}
