use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::actions::ActionRegistry;
use super::protocol;
use crate::config::ChannelConfig;
use crate::error::ChannelError;

/// Lifecycle of the host side of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No socket, no editor attached.
    Unconnected,
    /// Listening socket bound, waiting for the editor to connect back.
    Listening,
    /// Editor attached, reader task running.
    Connected,
    /// Explicitly closed; the next operation may reconnect.
    Closed,
}

/// Connection state owned by the supervisor: the listening socket, the
/// spawned editor process, the accepted stream and the background reader.
struct Link {
    state: ChannelState,
    port: u16,
    listener: Option<TcpListener>,
    writer: Option<OwnedWriteHalf>,
    child: Option<Child>,
    reader: Option<JoinHandle<()>>,
    /// Set by the reader task or a failed write; checked by liveness.
    failed: Arc<AtomicBool>,
}

impl Link {
    fn new() -> Self {
        Self {
            state: ChannelState::Unconnected,
            port: 0,
            listener: None,
            writer: None,
            child: None,
            reader: None,
            failed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn alive(&self) -> bool {
        self.listener.is_some() && self.writer.is_some() && !self.failed.load(Ordering::SeqCst)
    }

    /// Ordered teardown: stop the reader, then drop output, process
    /// handle and sockets. Safe to call repeatedly. Dropping the reader
    /// half closes the input stream; the editor process itself is left
    /// running and only noticed again via a fresh connection.
    fn teardown(&mut self, state: ChannelState) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.writer = None;
        self.child = None;
        self.listener = None;
        self.port = 0;
        self.state = state;
    }
}

/// Guarantees a connected, single-client channel to exactly one live
/// editor process, or reports a typed failure.
///
/// Each supervisor owns its own sockets, process handle and reader task;
/// two supervisors are two fully independent channels. Connection checks,
/// connection establishment and writes all run under one lock, so
/// check-then-act is a single critical section and at most one caller's
/// bytes are in flight at a time.
pub struct Supervisor {
    config: ChannelConfig,
    actions: Arc<ActionRegistry>,
    link: Arc<Mutex<Link>>,
    hooks: std::sync::Mutex<Vec<String>>,
}

impl Supervisor {
    pub fn new(config: ChannelConfig, actions: Arc<ActionRegistry>) -> Self {
        Self {
            config,
            actions,
            link: Arc::new(Mutex::new(Link::new())),
            hooks: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Queue a command to be replayed, in registration order, after every
    /// successful (re)connection. Takes effect on the next connection.
    pub fn add_start_hook(&self, sexp: impl Into<String>) {
        self.hooks.lock().unwrap().push(sexp.into());
    }

    pub async fn state(&self) -> ChannelState {
        self.link.lock().await.state
    }

    /// Port of the listening socket while one is bound.
    pub async fn port(&self) -> Option<u16> {
        let link = self.link.lock().await;
        link.listener.as_ref().map(|_| link.port)
    }

    /// Liveness check. A link found dead is torn down as a side effect.
    pub async fn is_alive(&self) -> bool {
        let mut link = self.link.lock().await;
        Self::check_locked(&mut link)
    }

    /// Bring the channel up if it is not already, spawning the editor and
    /// waiting for it to connect back.
    pub async fn ensure_running(&self) -> Result<(), ChannelError> {
        let mut link = self.link.lock().await;
        self.ensure_locked(&mut link).await
    }

    /// Ensure the channel is up, then write one command verbatim.
    pub async fn send(&self, sexp: &str) -> Result<(), ChannelError> {
        let mut link = self.link.lock().await;
        self.ensure_locked(&mut link).await?;
        Self::write_locked(&mut link, sexp).await
    }

    /// Write only if the channel is already alive; a dead channel counts
    /// as success and is not restarted.
    pub async fn send_if_alive(&self, sexp: &str) -> Result<(), ChannelError> {
        let mut link = self.link.lock().await;
        if !Self::check_locked(&mut link) {
            return Ok(());
        }
        Self::write_locked(&mut link, sexp).await
    }

    /// Idempotent teardown. Calling this on an already-closed channel is
    /// a no-op.
    pub async fn close(&self) {
        let mut link = self.link.lock().await;
        link.teardown(ChannelState::Closed);
    }

    fn check_locked(link: &mut Link) -> bool {
        if link.alive() {
            return true;
        }
        let next = if link.state == ChannelState::Closed {
            ChannelState::Closed
        } else {
            ChannelState::Unconnected
        };
        link.teardown(next);
        false
    }

    async fn ensure_locked(&self, link: &mut Link) -> Result<(), ChannelError> {
        if Self::check_locked(link) {
            return Ok(());
        }

        let (listener, port) = self.open_listening_socket().await?;
        link.port = port;
        link.state = ChannelState::Listening;

        let eval_arg = protocol::bootstrap(
            &self.config.bootstrap_prelude(),
            &self.config.app_name,
            &self.config.host,
            port,
        );
        debug!(port, program = %self.config.program.display(), "launching editor");
        let child = match Command::new(&self.config.program)
            .arg("--eval")
            .arg(&eval_arg)
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                error!(
                    "failed to launch {}: {err}",
                    self.config.program.display()
                );
                link.teardown(ChannelState::Unconnected);
                return Err(ChannelError::ProcessLaunchFailed(err));
            }
        };

        let stream = match tokio::time::timeout(self.config.accept_timeout(), listener.accept())
            .await
        {
            Ok(Ok((stream, _addr))) => stream,
            Ok(Err(err)) => {
                error!("accept failed on {}:{port}: {err}", self.config.host);
                link.teardown(ChannelState::Unconnected);
                return Err(ChannelError::AcceptFailed { port, source: err });
            }
            Err(_elapsed) => {
                error!(
                    "editor did not connect back on port {port} within {} ms",
                    self.config.accept_timeout_ms
                );
                link.teardown(ChannelState::Unconnected);
                return Err(ChannelError::AcceptTimedOut {
                    port,
                    timeout_ms: self.config.accept_timeout_ms,
                });
            }
        };

        let (read_half, write_half) = stream.into_split();
        let failed = Arc::new(AtomicBool::new(false));
        link.failed = failed.clone();
        link.writer = Some(write_half);
        link.listener = Some(listener);
        link.child = Some(child);
        link.reader = Some(spawn_reader(
            read_half,
            self.actions.clone(),
            self.link.clone(),
            failed,
        ));
        link.state = ChannelState::Connected;
        debug!(port, "editor connected");

        let hooks: Vec<String> = self.hooks.lock().unwrap().clone();
        for sexp in &hooks {
            Self::write_locked(link, sexp).await?;
        }
        Ok(())
    }

    /// Find a free port, scanning upward from `base_port` in `port_step`
    /// increments until the span is exhausted.
    async fn open_listening_socket(&self) -> Result<(TcpListener, u16), ChannelError> {
        let base = self.config.base_port;
        let last = base.saturating_add(self.config.port_span);
        let step = self.config.port_step.max(1);
        let mut port = base;
        while port < last {
            match TcpListener::bind((self.config.host.as_str(), port)).await {
                Ok(listener) => {
                    debug!(port, "listening for editor connection");
                    return Ok((listener, port));
                }
                Err(_) => match port.checked_add(step) {
                    Some(next) => port = next,
                    None => break,
                },
            }
        }
        Err(ChannelError::PortExhausted { base, last })
    }

    async fn write_locked(link: &mut Link, sexp: &str) -> Result<(), ChannelError> {
        let Some(writer) = link.writer.as_mut() else {
            return Err(ChannelError::StreamIo(io::Error::new(
                io::ErrorKind::NotConnected,
                "channel is not connected",
            )));
        };
        let result = async {
            writer.write_all(sexp.as_bytes()).await?;
            writer.flush().await
        }
        .await;
        if let Err(err) = result {
            warn!("write to editor failed: {err}");
            link.failed.store(true, Ordering::SeqCst);
            link.teardown(ChannelState::Unconnected);
            return Err(ChannelError::StreamIo(err));
        }
        Ok(())
    }
}

/// One reader task exists per connection. It blocks for at least one
/// byte, then drains whatever is immediately ready so a burst arriving
/// together dispatches as a single chunk, and hands non-empty chunks to
/// the action registry. End of stream and read errors tear the channel
/// down and end the task; `close` aborts it at the next read boundary.
fn spawn_reader(
    mut read_half: OwnedReadHalf,
    actions: Arc<ActionRegistry>,
    link: Arc<Mutex<Link>>,
    failed: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        loop {
            let n = match read_half.read(&mut buf).await {
                Ok(0) => {
                    debug!("editor closed the connection");
                    failed.store(true, Ordering::SeqCst);
                    reader_teardown(&link).await;
                    return;
                }
                Ok(n) => n,
                Err(err) => {
                    warn!("read from editor failed: {err}");
                    failed.store(true, Ordering::SeqCst);
                    reader_teardown(&link).await;
                    return;
                }
            };

            let mut chunk = buf[..n].to_vec();
            loop {
                let mut more = [0u8; 4096];
                match read_half.try_read(&mut more) {
                    // Peer closed; the blocking read above sees it next.
                    Ok(0) => break,
                    Ok(n) => chunk.extend_from_slice(&more[..n]),
                    Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => break,
                    Err(err) => {
                        warn!("read from editor failed: {err}");
                        failed.store(true, Ordering::SeqCst);
                        reader_teardown(&link).await;
                        return;
                    }
                }
            }

            let text = String::from_utf8_lossy(&chunk);
            let command = text.trim();
            if !command.is_empty() {
                actions.dispatch(command);
            }
        }
    })
}

async fn reader_teardown(link: &Arc<Mutex<Link>>) {
    let mut link = link.lock().await;
    link.teardown(ChannelState::Unconnected);
}
