use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::error;

use super::actions::ActionRegistry;
use super::buffering::BufferStore;
use super::protocol;
use super::supervisor::{ChannelState, Supervisor};
use crate::config::ChannelConfig;
use crate::error::ChannelError;

/// Facade over one supervised editor channel.
///
/// Cheap to clone; all clones drive the same channel. Every operation
/// first makes sure the channel is up, spawning the editor on demand, and
/// returns `Err` instead of panicking when it cannot be brought up.
#[derive(Clone)]
pub struct EmacsBridge {
    inner: Arc<Inner>,
}

struct Inner {
    supervisor: Supervisor,
    actions: Arc<ActionRegistry>,
    buffering: Mutex<BufferStore>,
}

impl EmacsBridge {
    pub fn new(config: ChannelConfig) -> Self {
        let actions = Arc::new(ActionRegistry::new());
        Self {
            inner: Arc::new(Inner {
                supervisor: Supervisor::new(config, actions.clone()),
                actions,
                buffering: Mutex::new(BufferStore::new()),
            }),
        }
    }

    /// Register a handler for an inbound editor command. Last
    /// registration for a name wins.
    pub fn register_action<F>(&self, name: impl Into<String>, action: F)
    where
        F: Fn(&[String]) + Send + Sync + 'static,
    {
        self.inner.actions.register(name, action);
    }

    /// Queue a command replayed after every (re)connection, e.g. to load
    /// an application major mode. Takes effect on the next connection.
    pub fn add_start_hook(&self, sexp: impl Into<String>) {
        self.inner.supervisor.add_start_hook(sexp);
    }

    /// Send a raw s-expression command verbatim.
    pub async fn eval(&self, sexp: &str) -> Result<(), ChannelError> {
        self.inner.supervisor.send(sexp).await
    }

    pub async fn ensure_running(&self) -> Result<(), ChannelError> {
        self.inner.supervisor.ensure_running().await
    }

    pub async fn is_alive(&self) -> bool {
        self.inner.supervisor.is_alive().await
    }

    pub async fn state(&self) -> ChannelState {
        self.inner.supervisor.state().await
    }

    pub async fn port(&self) -> Option<u16> {
        self.inner.supervisor.port().await
    }

    pub async fn close(&self) {
        self.inner.supervisor.close().await
    }

    /// Open `path` in the editor at `line` (1-based) and `col` (0-based).
    /// The mode string `"disabled"` opens the buffer read-only.
    pub async fn visit_file_position(
        &self,
        path: &Path,
        line: u32,
        col: u32,
        mode: &str,
    ) -> Result<(), ChannelError> {
        let dir = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.eval(&protocol::visit(&dir, &name, line, col, mode)).await
    }

    /// Append `text` to the named editor buffer. While a buffering
    /// session is open for `name` the text is held back locally and only
    /// goes out on the next flush.
    pub async fn append_to_buffer(&self, name: &str, text: &str) -> Result<(), ChannelError> {
        if self.inner.buffering.lock().unwrap().absorb(name, text) {
            return Ok(());
        }
        self.eval(&protocol::append_to_buffer(name, text)).await
    }

    /// Start coalescing appends to `name`. Idempotent.
    pub fn start_buffering(&self, name: &str) {
        self.inner.buffering.lock().unwrap().start(name);
    }

    /// Send everything accumulated for `name` as one append command and
    /// end the buffering session. A name with no session is a no-op.
    pub async fn flush_buffer(&self, name: &str) -> Result<(), ChannelError> {
        let pending = self.inner.buffering.lock().unwrap().flush(name);
        match pending {
            Some(text) => self.append_to_buffer(name, &text).await,
            None => Ok(()),
        }
    }

    pub async fn clear_buffer(&self, name: &str) -> Result<(), ChannelError> {
        self.eval(&protocol::clear_buffer(name)).await
    }

    pub async fn kill_buffer(&self, name: &str) -> Result<(), ChannelError> {
        self.eval(&protocol::kill_buffer(name)).await
    }

    pub async fn create_compilation_buffer(&self, name: &str) -> Result<(), ChannelError> {
        self.eval(&protocol::compilation_buffer(name)).await
    }

    /// Mark `files` as the project file set rooted at `root`.
    pub async fn mark_as_project_files(
        &self,
        root: &Path,
        files: &[PathBuf],
    ) -> Result<(), ChannelError> {
        let files: Vec<String> = files
            .iter()
            .map(|f| f.to_string_lossy().into_owned())
            .collect();
        self.eval(&protocol::project_files(&root.to_string_lossy(), &files))
            .await
    }

    /// Read `reader` to the end and append its content to the named
    /// buffer as one command. A failing reader sends what was read.
    pub async fn fill_buffer_from_stream<R>(
        &self,
        name: &str,
        reader: &mut R,
    ) -> Result<(), ChannelError>
    where
        R: AsyncRead + Unpin,
    {
        let mut content = String::new();
        if let Err(err) = reader.read_to_string(&mut content).await {
            error!("reading buffer fill stream failed: {err}");
        }
        self.eval(&protocol::fill_buffer(name, &content)).await
    }

    /// Ask the editor to save all buffers and exit. A channel that is not
    /// alive is already satisfied; the editor is never restarted just to
    /// be shut down.
    pub async fn exit_emacs(&self) -> Result<(), ChannelError> {
        self.inner
            .supervisor
            .send_if_alive(&protocol::save_buffers_kill())
            .await
    }
}
