//! TOML configuration for the router.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! router on `0.0.0.0:6400` with an empty static instance list.
//!
//! ```toml
//! [server]
//! listen_addr = "0.0.0.0:6400"
//! self_address = "http://talaria-0:6200"
//!
//! [ring]
//! vnodes = 211
//! hash = "xxh3"
//!
//! [discovery]
//! backend = "file"
//! file = "/etc/device-router/instances.toml"
//! poll_interval_ms = 5000
//!
//! [discovery.backoff]
//! max_attempts = 10
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use corelib::{Node, RingConfig};
use membership::Backoff;
use redirect::{HeaderExtractor, RedirectStatus, DEFAULT_DEVICE_HEADER};
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Listeners and redirect behaviour.
    pub server: ServerSection,
    /// Hash ring parameters; must match across routers.
    pub ring: RingConfig,
    /// Where membership comes from.
    pub discovery: DiscoverySection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[server]` section.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Address for redirected device traffic.
    pub listen_addr: SocketAddr,
    /// Address for `/healthz` and `/readyz`.
    pub health_listen_addr: SocketAddr,
    /// This router's own instance address, as the registry reports it.
    ///
    /// Devices owned by this address are served locally. Without it every
    /// request is redirected.
    pub self_address: Option<String>,
    /// Redirect status code: 302, 303 or 307.
    pub redirect_status: u16,
    /// Header carrying the device name.
    pub device_header: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 6400)),
            health_listen_addr: SocketAddr::from(([0, 0, 0, 0], 6401)),
            self_address: None,
            redirect_status: 307,
            device_header: DEFAULT_DEVICE_HEADER.to_string(),
        }
    }
}

/// Registry backend selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Fixed `instances` list.
    #[default]
    Static,
    /// Instance list polled from `file`.
    File,
}

/// `[discovery]` section.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoverySection {
    pub backend: Backend,
    /// Instance addresses for the static backend.
    pub instances: Vec<String>,
    /// Instance file for the file backend.
    pub file: Option<PathBuf>,
    /// How often the file backend re-reads its file.
    pub poll_interval_ms: u64,
    /// Reconnect policy for the registry watch.
    pub backoff: Backoff,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            backend: Backend::Static,
            instances: Vec::new(),
            file: None,
            poll_interval_ms: 5_000,
            backoff: Backoff::default(),
        }
    }
}

impl DiscoverySection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`). `RUST_LOG` wins.
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RouterConfig {
    /// Load and validate config from a TOML file, or use defaults if no
    /// path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read {}", p.display()))?;
                Self::from_toml(&content)
                    .with_context(|| format!("invalid config file {}", p.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a TOML string without validating it.
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.redirect_status()?;
        self.device_extractor()?;
        self.self_node()?;

        if self.discovery.backend == Backend::File && self.discovery.file.is_none() {
            bail!("discovery backend \"file\" needs discovery.file");
        }
        if self.discovery.poll_interval_ms == 0 {
            bail!("discovery.poll_interval_ms must be positive");
        }
        let backoff = &self.discovery.backoff;
        if backoff.initial_ms == 0 || backoff.max_ms < backoff.initial_ms {
            bail!("discovery.backoff needs 0 < initial_ms <= max_ms");
        }
        Ok(())
    }

    /// `[redirect] status` as a checked redirect code.
    pub fn redirect_status(&self) -> anyhow::Result<RedirectStatus> {
        Ok(RedirectStatus::try_from(self.server.redirect_status)?)
    }

    pub fn device_extractor(&self) -> anyhow::Result<HeaderExtractor> {
        Ok(HeaderExtractor::new(&self.server.device_header)?)
    }

    /// This router's node identity, if configured.
    pub fn self_node(&self) -> anyhow::Result<Option<Node>> {
        self.server
            .self_address
            .as_deref()
            .map(|addr| Node::parse(addr).context("invalid server.self_address"))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::PartitionerKind;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RouterConfig::from_toml("").unwrap();
        config.validate().unwrap();

        assert_eq!(config.server.listen_addr.port(), 6400);
        assert_eq!(config.server.health_listen_addr.port(), 6401);
        assert_eq!(config.server.redirect_status, 307);
        assert_eq!(config.server.device_header, "X-Webpa-Device-Name");
        assert_eq!(config.ring, RingConfig::default());
        assert_eq!(config.ring.vnodes.get(), 211);
        assert_eq!(config.discovery.backend, Backend::Static);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_full_config() {
        let config = RouterConfig::from_toml(
            r#"
            [server]
            listen_addr = "127.0.0.1:7000"
            health_listen_addr = "127.0.0.1:7001"
            self_address = "talaria-0:6200"
            redirect_status = 302
            device_header = "X-Device"

            [ring]
            vnodes = 64
            hash = "sip"

            [discovery]
            backend = "file"
            file = "/tmp/instances.toml"
            poll_interval_ms = 250

            [discovery.backoff]
            initial_ms = 100
            max_ms = 1000
            max_attempts = 3

            [log]
            level = "debug"
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.ring.vnodes.get(), 64);
        assert_eq!(config.ring.hash, PartitionerKind::Siphash);
        assert_eq!(config.discovery.backend, Backend::File);
        assert_eq!(config.discovery.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.discovery.backoff.max_attempts, 3);
        assert_eq!(
            config.self_node().unwrap().unwrap().address(),
            "http://talaria-0:6200"
        );
        assert_eq!(
            config.redirect_status().unwrap(),
            RedirectStatus::FOUND
        );
    }

    #[test]
    fn test_permanent_redirect_rejected() {
        for status in [301, 308, 200] {
            let config =
                RouterConfig::from_toml(&format!("[server]\nredirect_status = {status}\n")).unwrap();
            assert!(config.validate().is_err(), "{status} should be rejected");
        }
    }

    #[test]
    fn test_zero_vnodes_rejected() {
        assert!(RouterConfig::from_toml("[ring]\nvnodes = 0\n").is_err());
    }

    #[test]
    fn test_unknown_hash_rejected() {
        assert!(RouterConfig::from_toml("[ring]\nhash = \"md5\"\n").is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(RouterConfig::from_toml("[server]\nlisten = \"0.0.0.0:1\"\n").is_err());
    }

    #[test]
    fn test_file_backend_needs_path() {
        let config = RouterConfig::from_toml("[discovery]\nbackend = \"file\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_self_address_rejected() {
        let config =
            RouterConfig::from_toml("[server]\nself_address = \"http://\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.toml");
        std::fs::write(&path, "[discovery]\ninstances = [\"a:80\", \"b:80\"]\n").unwrap();

        let config = RouterConfig::load(Some(&path)).unwrap();
        assert_eq!(config.discovery.instances, ["a:80", "b:80"]);

        assert!(RouterConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
