//! A fake HTTP management agent for transport and CLI tests.
//!
//! Listens on an ephemeral loopback port, answers one request per connection
//! and records every request body it sees. Requests are served from a
//! [`FakeTarget`], so level changes persist for the agent's lifetime.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

use super::fake_target::FakeTarget;
use crate::management::{ManagementConnection, ManagementError};

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// A running fake agent; stops when dropped.
pub struct FakeAgent {
    port: u16,
    target: Arc<Mutex<FakeTarget>>,
    requests: Arc<Mutex<Vec<Value>>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeAgent {
    /// Starts serving `target` on `127.0.0.1`.
    pub fn spawn(target: FakeTarget) -> io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        listener.set_nonblocking(true)?;
        let port = listener.local_addr()?.port();
        let target = Arc::new(Mutex::new(target));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let handle = {
            let target = Arc::clone(&target);
            let requests = Arc::clone(&requests);
            let shutdown = Arc::clone(&shutdown);
            thread::spawn(move || serve(&listener, &target, &requests, &shutdown))
        };
        Ok(Self {
            port,
            target,
            requests,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Port the agent listens on.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// URL clients should post to.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}/jolokia/", self.port)
    }

    /// Request bodies received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the served target.
    #[must_use]
    pub fn target(&self) -> FakeTarget {
        self.target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for FakeAgent {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(
    listener: &TcpListener,
    target: &Mutex<FakeTarget>,
    requests: &Mutex<Vec<Value>>,
    shutdown: &AtomicBool,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                // A broken client connection only affects that request.
                let _ = handle_connection(stream, target, requests);
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(POLL_INTERVAL);
            }
            Err(_) => return,
        }
    }
}

fn handle_connection(
    mut stream: TcpStream,
    target: &Mutex<FakeTarget>,
    requests: &Mutex<Vec<Value>>,
) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let body = read_request_body(&stream)?;
    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(request.clone());

    let envelope = {
        let mut target = target.lock().unwrap_or_else(PoisonError::into_inner);
        answer(&mut target, &request)
    };
    let payload = envelope.to_string();
    write!(
        stream,
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    )?;
    stream.flush()
}

fn read_request_body(stream: &TcpStream) -> io::Result<Vec<u8>> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut content_length = 0_usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let header = line.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':')
            && name.trim().eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body)?;
    Ok(body)
}

fn answer(target: &mut FakeTarget, request: &Value) -> Value {
    let field = |name: &str| request.get(name).and_then(Value::as_str).unwrap_or_default();
    let outcome = match field("type") {
        "version" => Ok(json!({"agent": "fake", "protocol": "7.2"})),
        "read" => target.get_attribute(field("mbean"), field("attribute")),
        "exec" => {
            let arguments = request
                .get("arguments")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            target.invoke(field("mbean"), field("operation"), &arguments)
        }
        other => Err(ManagementError::Remote {
            error_type: String::from("java.lang.UnsupportedOperationException"),
            message: format!("unknown request type {other:?}"),
        }),
    };
    match outcome {
        Ok(value) => json!({"status": 200, "value": value}),
        Err(error) => error_envelope(&error),
    }
}

fn error_envelope(error: &ManagementError) -> Value {
    let (status, error_type, message) = match error {
        ManagementError::RegistryMissing { registry } => (
            404,
            "javax.management.InstanceNotFoundException",
            registry.clone(),
        ),
        ManagementError::Rejected { message } => {
            (400, "java.lang.IllegalArgumentException", message.clone())
        }
        ManagementError::Remote {
            error_type,
            message,
        } => (500, error_type.as_str(), message.clone()),
        ManagementError::Transport { message } | ManagementError::Protocol { message } => {
            (500, "java.io.IOException", message.clone())
        }
    };
    json!({
        "status": status,
        "error_type": error_type,
        "error": format!("{error_type} : {message}"),
    })
}
