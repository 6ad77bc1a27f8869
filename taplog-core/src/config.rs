use crate::policy::RedactionPolicy;
use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Top-level Taplog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaplogConfig {
    /// Human-readable component/source tag stamped into every published
    /// entry as `tags["component"]`.
    #[serde(default = "default_component")]
    pub component: String,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub consumer: ConsumerConfig,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Message bus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Broker address. The in-process bus ignores it; networked bus
    /// implementations connect here.
    #[serde(default = "default_bus_endpoint")]
    pub endpoint: String,
    /// Bounded capacity of the in-process bus. Oldest records are dropped
    /// when a subscriber falls this far behind.
    #[serde(default = "default_bus_capacity")]
    pub capacity: usize,
}

/// Capture settings — the redaction policy options, all off by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default)]
    pub exclude_kinds: Vec<String>,
    #[serde(default)]
    pub hide_body_kinds: Vec<String>,
    #[serde(default)]
    pub enable_error_tracking: bool,
    #[serde(default)]
    pub enable_request_body_tracking: bool,
    #[serde(default)]
    pub enable_response_tracking: bool,
    #[serde(default)]
    pub enable_session_tracking: bool,
    #[serde(default)]
    pub required_access_roles: Vec<String>,
}

/// Embedded reference consumer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// When true, the server embeds a listener on the in-process bus that
    /// renders received entries to diagnostic output.
    #[serde(default)]
    pub enabled: bool,
}

/// Demo host settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_host_addr")]
    pub addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// When false, no prometheus counters are updated on the capture path.
    #[serde(default)]
    pub enabled: bool,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_component() -> String { "taplog".into() }
fn default_bus_endpoint() -> String { "mem://local".into() }
fn default_bus_capacity() -> usize { 1024 }
fn default_host_addr() -> String { "0.0.0.0:8080".into() }

// ── Impls ─────────────────────────────────────────────────────

impl Default for TaplogConfig {
    fn default() -> Self {
        Self {
            component: default_component(),
            bus: BusConfig::default(),
            capture: CaptureConfig::default(),
            consumer: ConsumerConfig::default(),
            host: HostConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            endpoint: default_bus_endpoint(),
            capacity: default_bus_capacity(),
        }
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self { enabled: false }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { addr: default_host_addr() }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: false }
    }
}

impl TaplogConfig {
    /// Load configuration from YAML file + env overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: TaplogConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("TAPLOG_").split("_"))
            .extract()?;
        Ok(config)
    }
}

impl CaptureConfig {
    /// Freeze these options into the immutable policy consulted by the
    /// entry builder.
    pub fn policy(&self) -> RedactionPolicy {
        RedactionPolicy {
            exclude_kinds: to_set(&self.exclude_kinds),
            hide_body_kinds: to_set(&self.hide_body_kinds),
            enable_error_tracking: self.enable_error_tracking,
            enable_request_body_tracking: self.enable_request_body_tracking,
            enable_response_tracking: self.enable_response_tracking,
            enable_session_tracking: self.enable_session_tracking,
            required_access_roles: to_set(&self.required_access_roles),
        }
    }
}

fn to_set(values: &[String]) -> HashSet<String> {
    values.iter().cloned().collect()
}
