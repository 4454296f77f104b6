//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::net::TcpStream;

use service_scaffold::{BoxError, ErrorReporter, WorkStarter};

/// Reserve a free loopback port and release it for the server under test.
pub fn free_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Poll until something accepts connections on `addr`.
pub async fn wait_until_listening(addr: SocketAddr) {
    for _ in 0..200 {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("nothing listening on {}", addr);
}

/// How a `Scripted` work behaves.
#[derive(Debug, Clone)]
pub enum Script {
    /// Run until shutdown, drain cleanly.
    Idle,
    /// Report `message` as fatal right after start.
    FailOnStart(&'static str),
    /// Run until shutdown, then fail the drain with `message`.
    FailDrain(&'static str),
    /// Run until shutdown, then take `Duration` to drain.
    SlowDrain(Duration),
    /// End cleanly right after start, without a fatal error.
    Complete,
}

/// Work starter driven by a `Script`.
pub struct Scripted {
    script: Script,
    held: Option<ErrorReporter>,
    drained: Arc<AtomicBool>,
}

impl Scripted {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            held: None,
            drained: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag set once `shutdown` has been called.
    pub fn drained(&self) -> Arc<AtomicBool> {
        self.drained.clone()
    }
}

impl WorkStarter for Scripted {
    fn start(&mut self, errors: ErrorReporter) {
        match self.script {
            Script::FailOnStart(message) => errors.report(message),
            Script::Complete => drop(errors),
            _ => self.held = Some(errors),
        }
    }

    fn shutdown(&mut self) -> BoxFuture<'_, Result<(), BoxError>> {
        self.drained.store(true, Ordering::SeqCst);
        let script = self.script.clone();
        Box::pin(async move {
            match script {
                Script::FailDrain(message) => Err(message.into()),
                Script::SlowDrain(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(())
                }
                _ => Ok(()),
            }
        })
    }
}
