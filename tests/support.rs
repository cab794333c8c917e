#![allow(dead_code)]

use std::ffi::OsStr;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
    connections: Arc<AtomicUsize>,
}

impl ServerHandle {
    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawns a keep-alive HTTP/1.1 server that answers every request with
/// `status` after `delay`.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_http_server(status: u16, delay: Duration) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let connections = Arc::new(AtomicUsize::new(0));
    let accepted = Arc::clone(&connections);

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    thread::spawn(move || handle_client(stream, status, delay));
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(2));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        format!("http://{}", addr),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
            connections,
        },
    ))
}

fn handle_client(mut stream: TcpStream, status: u16, delay: Duration) {
    if stream.set_nonblocking(false).is_err()
        || stream.set_read_timeout(Some(Duration::from_secs(5))).is_err()
    {
        return;
    }
    let reply = format!(
        "HTTP/1.1 {} Test\r\nContent-Length: 2\r\nContent-Type: text/plain\r\n\r\nOK",
        status
    );
    let mut pending = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(read) => read,
        };
        pending.extend_from_slice(&chunk[..read]);
        while let Some(end) = request_end(&pending) {
            pending.drain(..end);
            thread::sleep(delay);
            if stream.write_all(reply.as_bytes()).is_err() || stream.flush().is_err() {
                return;
            }
        }
    }
}

/// Length of the first complete request in `buffer`, body included.
fn request_end(buffer: &[u8]) -> Option<usize> {
    let head_end = buffer.windows(4).position(|window| window == b"\r\n\r\n")? + 4;
    let head = String::from_utf8_lossy(&buffer[..head_end]).to_ascii_lowercase();
    let body_len = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let total = head_end + body_len;
    (buffer.len() >= total).then_some(total)
}

/// An address nothing listens on.
///
/// # Errors
///
/// Returns an error if no ephemeral port can be reserved.
pub fn refused_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("local addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

/// Writes a JSON config for `url` into `dir` and returns its path.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_config(
    dir: &Path,
    url: &str,
    rate: u64,
    duration: &str,
    concurrency: usize,
) -> Result<std::path::PathBuf, String> {
    let path = dir.join("shard.json");
    let content = format!(
        r#"{{
  "target": {{ "url": "{url}", "method": "GET" }},
  "load": {{
    "rate": {rate},
    "duration": "{duration}",
    "concurrency": {concurrency},
    "timeout": "2s"
  }},
  "output": {{
    "jsonl_path": "{results}",
    "progress_path": "{progress}",
    "progress_interval": "200ms"
  }}
}}"#,
        results = dir.join("results.jsonl").display(),
        progress = dir.join("progress.log").display(),
    );
    std::fs::write(&path, content).map_err(|err| format!("write config failed: {}", err))?;
    Ok(path)
}

/// Runs the `shard` binary and captures its output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_shard<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = shard_bin()?;
    Command::new(bin)
        .args(args)
        .env("SHARD_LOG", "info")
        .output()
        .map_err(|err| format!("run shard failed: {}", err))
}

fn shard_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_shard").map_or_else(
        || Err("CARGO_BIN_EXE_shard missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
