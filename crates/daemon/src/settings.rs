//! Daemon settings from `SUBSYNC_*` environment variables

use anyhow::{Context, Result};
use config::{Config, Environment};
use std::time::Duration;
use subsync_api_rpc::RpcServerConfig;
use subsync_core::application::{RateLimitConfig, RateLimits, ReaperConfig};
use subsync_core::domain::Platform;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: i64 = 9528;
const DEFAULT_RETENTION_HOURS: i64 = 24;
const DEFAULT_REAPER_INTERVAL_MINUTES: i64 = 60;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct DaemonSettings {
    pub rpc: RpcServerConfig,
    pub reaper: ReaperConfig,
    /// Age after which the reaper drops a session
    pub session_ttl: Duration,
    pub rate_limits: RateLimits,
    /// `json` or `pretty`
    pub log_format: String,
}

impl DaemonSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_environment(Environment::with_prefix("SUBSYNC"))
    }

    /// Keys are read without the `SUBSYNC_` prefix (`rpc_port`, ...)
    pub fn from_environment(env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .set_default("rpc_host", DEFAULT_RPC_HOST)?
            .set_default("rpc_port", DEFAULT_RPC_PORT)?
            .set_default("job_retention_hours", DEFAULT_RETENTION_HOURS)?
            .set_default("reaper_interval_minutes", DEFAULT_REAPER_INTERVAL_MINUTES)?
            .set_default("session_ttl_hours", DEFAULT_SESSION_TTL_HOURS)?
            .set_default("log_format", "pretty")?
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to read SUBSYNC_* settings")?;

        let port = settings
            .get_int("rpc_port")
            .context("SUBSYNC_RPC_PORT must be a number")?;
        let retention_hours = settings
            .get_int("job_retention_hours")
            .context("SUBSYNC_JOB_RETENTION_HOURS must be a number")?;
        let interval_minutes = settings
            .get_int("reaper_interval_minutes")
            .context("SUBSYNC_REAPER_INTERVAL_MINUTES must be a number")?;

        let session_ttl_hours = settings
            .get_int("session_ttl_hours")
            .context("SUBSYNC_SESSION_TTL_HOURS must be a number")?;
        if session_ttl_hours <= 0 {
            anyhow::bail!("SUBSYNC_SESSION_TTL_HOURS must be positive");
        }

        if interval_minutes <= 0 {
            anyhow::bail!("SUBSYNC_REAPER_INTERVAL_MINUTES must be positive");
        }

        let rate_limits = rate_limits(&settings)?;

        Ok(Self {
            rpc: RpcServerConfig {
                host: settings.get_string("rpc_host")?,
                port: u16::try_from(port).context("SUBSYNC_RPC_PORT out of range")?,
            },
            reaper: ReaperConfig {
                retention: Duration::from_secs(retention_hours.max(0) as u64 * 3600),
                interval: Duration::from_secs(interval_minutes as u64 * 60),
            },
            session_ttl: Duration::from_secs(session_ttl_hours as u64 * 3600),
            rate_limits,
            log_format: settings.get_string("log_format")?,
        })
    }
}

/// Per-platform budgets: `<platform>_requests_per_minute` and a shared
/// `request_spacing_ms`, each falling back to the platform default
fn rate_limits(settings: &Config) -> Result<RateLimits> {
    let spacing = match settings.get_int("request_spacing_ms") {
        Ok(ms) if ms >= 0 => Some(Duration::from_millis(ms as u64)),
        Ok(_) => anyhow::bail!("SUBSYNC_REQUEST_SPACING_MS must not be negative"),
        Err(config::ConfigError::NotFound(_)) => None,
        Err(e) => return Err(e).context("SUBSYNC_REQUEST_SPACING_MS must be a number"),
    };

    let mut limits = RateLimits::default();
    for platform in Platform::ALL {
        let key = format!("{}_requests_per_minute", platform);
        let mut config = RateLimitConfig::for_platform(platform);
        match settings.get_int(&key) {
            Ok(n) if n > 0 => {
                config.max_requests = u32::try_from(n)
                    .with_context(|| format!("SUBSYNC_{} out of range", key.to_uppercase()))?;
            }
            Ok(_) => anyhow::bail!("SUBSYNC_{} must be positive", key.to_uppercase()),
            Err(config::ConfigError::NotFound(_)) => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("SUBSYNC_{} must be a number", key.to_uppercase()))
            }
        }
        if let Some(spacing) = spacing {
            config.request_spacing = spacing;
        }
        limits = limits.with(platform, config);
    }
    Ok(limits)
}
