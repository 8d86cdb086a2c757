//! # Panel Configuration
//!
//! Runtime parameters read from the environment. Every value has a default;
//! a value that is present but does not parse is an error rather than being
//! silently replaced.

use std::env;
use std::time::Duration;

use devtools_catalog::{coalesced_topics, DevtoolsTopic};
use shared_bus::{DrainBudget, DrainMode, SchedulerConfig, DEFAULT_STARVATION_BOUND};
use thiserror::Error;

/// Default agent listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:9229";

/// Default interval between metric snapshots.
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable is set but its value is unusable.
    #[error("{var}={value:?} is invalid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Complete panel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    /// Address the agent connects to.
    pub listen_addr: String,
    /// Scheduler tuning for every session.
    pub scheduler: SchedulerSettings,
    /// How often session counters are copied into Prometheus.
    pub metrics_interval: Duration,
}

/// Scheduler knobs, independent of any catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Starvation bound `K`; `None` disables the guard.
    pub starvation_bound: Option<u32>,
    pub drain_max_messages: Option<usize>,
    pub drain_max_duration: Option<Duration>,
    /// Per-class cap applied to every class.
    pub queue_capacity: Option<usize>,
    pub drain_mode: DrainMode,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            starvation_bound: Some(DEFAULT_STARVATION_BOUND),
            drain_max_messages: None,
            drain_max_duration: None,
            queue_capacity: None,
            drain_mode: DrainMode::Inline,
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            scheduler: SchedulerSettings::default(),
            metrics_interval: DEFAULT_METRICS_INTERVAL,
        }
    }
}

impl PanelConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PANEL_LISTEN_ADDR`: agent listen address (default: 127.0.0.1:9229)
    /// - `PANEL_STARVATION_BOUND`: `K`, or `off` for strict priority (default: 3)
    /// - `PANEL_DRAIN_MAX_MESSAGES`: per-pass message budget (default: unbounded)
    /// - `PANEL_DRAIN_MAX_MILLIS`: per-pass time budget (default: unbounded)
    /// - `PANEL_QUEUE_CAPACITY`: per-class cap, drop-oldest (default: unbounded)
    /// - `PANEL_DRAIN_MODE`: `inline` or `deferred` (default: inline)
    /// - `PANEL_METRICS_INTERVAL_MS`: metric snapshot period (default: 5000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let starvation_bound = match lookup("PANEL_STARVATION_BOUND") {
            None => defaults.scheduler.starvation_bound,
            Some(value) if value.eq_ignore_ascii_case("off") => None,
            Some(value) => Some(parse_positive("PANEL_STARVATION_BOUND", value)?),
        };

        let drain_mode = match lookup("PANEL_DRAIN_MODE") {
            None => defaults.scheduler.drain_mode,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "inline" => DrainMode::Inline,
                "deferred" => DrainMode::Deferred,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "PANEL_DRAIN_MODE",
                        value,
                        reason: "expected `inline` or `deferred`".to_string(),
                    })
                }
            },
        };

        let scheduler = SchedulerSettings {
            starvation_bound,
            drain_max_messages: optional("PANEL_DRAIN_MAX_MESSAGES", &lookup)?,
            drain_max_duration: optional::<u64>("PANEL_DRAIN_MAX_MILLIS", &lookup)?
                .map(Duration::from_millis),
            queue_capacity: optional("PANEL_QUEUE_CAPACITY", &lookup)?,
            drain_mode,
        };

        Ok(Self {
            listen_addr: lookup("PANEL_LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            scheduler,
            metrics_interval: optional::<u64>("PANEL_METRICS_INTERVAL_MS", &lookup)?
                .map_or(defaults.metrics_interval, Duration::from_millis),
        })
    }

    /// Scheduler configuration for the devtools catalog.
    pub fn scheduler_config(&self) -> SchedulerConfig<DevtoolsTopic> {
        let settings = &self.scheduler;
        let mut config = SchedulerConfig::default()
            .with_starvation_bound(settings.starvation_bound)
            .with_budget(DrainBudget {
                max_messages: settings.drain_max_messages,
                max_duration: settings.drain_max_duration,
            })
            .with_drain_mode(settings.drain_mode)
            .coalescing(coalesced_topics());
        if let Some(capacity) = settings.queue_capacity {
            config = config.with_queue_capacity_all(capacity);
        }
        config
    }
}

fn optional<T>(
    var: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr + PartialEq + From<u8>,
{
    lookup(var).map(|value| parse_positive(var, value)).transpose()
}

fn parse_positive<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + From<u8>,
{
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed != T::from(0) => Ok(parsed),
        Ok(_) => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: "must be greater than zero".to_string(),
        }),
        Err(_) => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: "not a number".to_string(),
        }),
    }
}
