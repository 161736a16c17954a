//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a static artifact body at `/resolve/artifact.zip` (HEAD and
//! ranged GET, 206/416 semantics) and a pointer document at
//! `/raw/artifact.zip`, mirroring the hosting convention the pipeline
//! derives pointer URLs from. Can simulate a one-shot mid-body connection
//! drop and a permanently failing source.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// Close the connection once after this many bytes of the body have
    /// been sent (across the whole transfer, not per response).
    pub drop_after: Option<u64>,
    /// Every artifact GET returns 500.
    pub always_fail: bool,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            drop_after: None,
            always_fail: false,
        }
    }
}

/// Handle to a running test server.
pub struct TestServer {
    base_url: String,
    artifact_hits: Arc<AtomicU32>,
}

impl TestServer {
    /// Content URL of the served artifact.
    pub fn artifact_url(&self) -> String {
        format!("{}resolve/artifact.zip", self.base_url)
    }

    /// Number of GET requests made for the artifact so far.
    pub fn artifact_hits(&self) -> u32 {
        self.artifact_hits.load(Ordering::SeqCst)
    }
}

/// Start a server with default options.
pub fn start(body: Vec<u8>, pointer: Vec<u8>) -> TestServer {
    start_with_options(body, pointer, RangeServerOptions::default())
}

/// Start a server in a background thread. Runs until the process exits.
pub fn start_with_options(
    body: Vec<u8>,
    pointer: Vec<u8>,
    opts: RangeServerOptions,
) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let pointer = Arc::new(pointer);
    let artifact_hits = Arc::new(AtomicU32::new(0));
    let dropped = Arc::new(AtomicBool::new(false));

    let hits = Arc::clone(&artifact_hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let pointer = Arc::clone(&pointer);
            let hits = Arc::clone(&hits);
            let dropped = Arc::clone(&dropped);
            thread::spawn(move || handle(stream, &body, &pointer, opts, &hits, &dropped));
        }
    });

    TestServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        artifact_hits,
    }
}

fn handle(
    mut stream: TcpStream,
    body: &[u8],
    pointer: &[u8],
    opts: RangeServerOptions,
    hits: &AtomicU32,
    dropped: &AtomicBool,
) {
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
    let (method, path, range) = parse_request(request);

    if path.ends_with("/raw/artifact.zip") {
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            pointer.len()
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.write_all(pointer);
        return;
    }

    let total = body.len() as u64;

    if method.eq_ignore_ascii_case("HEAD") {
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\nConnection: close\r\n\r\n",
            total
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    hits.fetch_add(1, Ordering::SeqCst);

    if opts.always_fail {
        let _ =
            stream.write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    let start = match range {
        Some(start) if opts.support_ranges => start,
        _ => 0,
    };

    if start >= total && total > 0 {
        let response = format!(
            "HTTP/1.1 416 Range Not Satisfiable\r\nContent-Range: bytes */{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            total
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    let slice = &body[start as usize..];
    let (status, content_range) = if start > 0 {
        (
            "206 Partial Content",
            format!(
                "Content-Range: bytes {}-{}/{}\r\n",
                start,
                total.saturating_sub(1),
                total
            ),
        )
    } else {
        ("200 OK", String::new())
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}Accept-Ranges: bytes\r\nConnection: close\r\n\r\n",
        status,
        slice.len(),
        content_range
    );
    let _ = stream.write_all(response.as_bytes());

    // Simulate a one-shot connection drop partway through the body.
    if let Some(drop_after) = opts.drop_after {
        if drop_after > start && !dropped.swap(true, Ordering::SeqCst) {
            let cut = (drop_after - start) as usize;
            let _ = stream.write_all(&slice[..cut.min(slice.len())]);
            return;
        }
    }

    let _ = stream.write_all(slice);
}

/// Returns (method, path, optional range start for `Range: bytes=X-`).
fn parse_request(request: &str) -> (&str, &str, Option<u64>) {
    let mut method = "";
    let mut path = "";
    let mut range = None;

    for (i, line) in request.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if i == 0 {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("");
            path = parts.next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(spec) = value.strip_prefix("bytes=") {
                    let start = spec.split('-').next().unwrap_or("");
                    range = start.parse::<u64>().ok();
                }
            }
        }
    }

    (method, path, range)
}
