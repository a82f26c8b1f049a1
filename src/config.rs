use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::channel::protocol;

/// Editor-side bootstrap code bundled into the binary. Used when the
/// config names neither a load path nor inline source.
const BUNDLED_BOOTSTRAP: &str = include_str!("../resources/embridge.el");

/// Settings for one editor channel.
///
/// Every field has a default, so an empty TOML file (or no file at all)
/// yields a working configuration that launches `emacs` on loopback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Visible name of the host application; shown in editor buffers and
    /// menus and embedded in the bootstrap expression.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Editor executable to launch.
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Loopback address the editor connects back to.
    #[serde(default = "default_host")]
    pub host: String,

    /// First candidate port for the listening socket.
    #[serde(default = "default_base_port")]
    pub base_port: u16,

    /// Increment between candidate ports when a bind fails.
    #[serde(default = "default_port_step")]
    pub port_step: u16,

    /// Size of the scan range above `base_port`.
    #[serde(default = "default_port_span")]
    pub port_span: u16,

    /// How long to wait for the spawned editor to connect back.
    #[serde(default = "default_accept_timeout_ms")]
    pub accept_timeout_ms: u64,

    /// Directory containing `embridge.el`; added to the editor's load
    /// path instead of shipping the bundled source inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_load_path: Option<PathBuf>,

    /// Inline bootstrap source; takes precedence over everything else.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_inline: Option<String>,
}

fn default_app_name() -> String {
    "embridge".to_string()
}

fn default_program() -> PathBuf {
    PathBuf::from("emacs")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_base_port() -> u16 {
    4444
}

fn default_port_step() -> u16 {
    20
}

fn default_port_span() -> u16 {
    1000
}

fn default_accept_timeout_ms() -> u64 {
    60_000
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new(default_app_name())
    }
}

impl ChannelConfig {
    /// Default configuration for the application `app_name`.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            program: default_program(),
            host: default_host(),
            base_port: default_base_port(),
            port_step: default_port_step(),
            port_span: default_port_span(),
            accept_timeout_ms: default_accept_timeout_ms(),
            bootstrap_load_path: None,
            bootstrap_inline: None,
        }
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ChannelConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn accept_timeout(&self) -> Duration {
        Duration::from_millis(self.accept_timeout_ms)
    }

    /// Editor-side code evaluated before the connect-back call: inline
    /// source if set, otherwise a load-path require, otherwise the
    /// bundled copy of `embridge.el`.
    pub fn bootstrap_prelude(&self) -> String {
        if let Some(code) = &self.bootstrap_inline {
            return code.clone();
        }
        if let Some(dir) = &self.bootstrap_load_path {
            return protocol::load_path_prelude(&dir.to_string_lossy());
        }
        BUNDLED_BOOTSTRAP.to_string()
    }
}
