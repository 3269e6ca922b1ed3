//! Minimal HTTP/1.1 server that answers `GET /todos/{id}` for integration tests.
//!
//! Each request consumes the next scripted status. Once the script runs out
//! the server answers 200 with a JSON todo for the requested id.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Handle to a running server: base URL plus the paths it has been asked for.
#[derive(Clone)]
pub struct TodoServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    paths: Arc<Mutex<Vec<String>>>,
}

impl TodoServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start(script: Vec<u16>) -> TodoServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let server = TodoServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        hits: Arc::new(AtomicUsize::new(0)),
        paths: Arc::new(Mutex::new(Vec::new())),
    };
    let script = Arc::new(script);
    let state = server.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let script = Arc::clone(&script);
            let state = state.clone();
            thread::spawn(move || handle(stream, &script, &state));
        }
    });
    server
}

fn handle(mut stream: std::net::TcpStream, script: &[u16], state: &TodoServer) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let index = state.hits.fetch_add(1, Ordering::SeqCst);
    state.paths.lock().unwrap().push(path.clone());

    let (status, body) = match script.get(index) {
        Some(&code) => (code, format!("{{\"error\":{}}}", code)),
        None => match path.strip_prefix("/todos/") {
            Some(id) => (
                200,
                format!(
                    "{{\"userId\":1,\"id\":{},\"title\":\"delectus aut autem\",\"completed\":false}}",
                    id
                ),
            ),
            None => (404, "{}".to_string()),
        },
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason(status),
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
