//! Runtime settings, read from `CERTDESK_*` environment variables.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};

const MAX_WORKSPACE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind: SocketAddr,
    pub auth_latency: Duration,
    pub verification_delay: Duration,
    pub search_delay: Duration,
    pub verified_probability: f64,
    /// Mount dashboards with the demo certificates and checks already present.
    pub seed_demo_records: bool,
    /// Idle time after which a workspace is dropped.
    pub workspace_ttl: Duration,
    pub max_workspaces: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            auth_latency: Duration::from_millis(1000),
            verification_delay: Duration::from_millis(3000),
            search_delay: Duration::from_millis(2000),
            verified_probability: 0.7,
            seed_demo_records: true,
            workspace_ttl: Duration::from_secs(2 * 24 * 60 * 60),
            max_workspaces: 10_000,
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let settings = Self {
            bind: parse(&lookup, "CERTDESK_BIND")?.unwrap_or(defaults.bind),
            auth_latency: millis(&lookup, "CERTDESK_AUTH_LATENCY_MS")?
                .unwrap_or(defaults.auth_latency),
            verification_delay: millis(&lookup, "CERTDESK_VERIFICATION_DELAY_MS")?
                .unwrap_or(defaults.verification_delay),
            search_delay: millis(&lookup, "CERTDESK_SEARCH_DELAY_MS")?
                .unwrap_or(defaults.search_delay),
            verified_probability: parse(&lookup, "CERTDESK_VERIFIED_PROBABILITY")?
                .unwrap_or(defaults.verified_probability),
            seed_demo_records: parse(&lookup, "CERTDESK_SEED_DEMO_RECORDS")?
                .unwrap_or(defaults.seed_demo_records),
            workspace_ttl: parse::<u64, F>(&lookup, "CERTDESK_WORKSPACE_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.workspace_ttl),
            max_workspaces: parse(&lookup, "CERTDESK_MAX_WORKSPACES")?
                .unwrap_or(defaults.max_workspaces),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.verified_probability) {
            bail!(
                "CERTDESK_VERIFIED_PROBABILITY must be within 0..=1, got {}",
                self.verified_probability
            );
        }
        if self.workspace_ttl.is_zero() || self.workspace_ttl > MAX_WORKSPACE_TTL {
            bail!(
                "CERTDESK_WORKSPACE_TTL_SECS must be within 1..={}, got {}",
                MAX_WORKSPACE_TTL.as_secs(),
                self.workspace_ttl.as_secs()
            );
        }
        if self.max_workspaces == 0 {
            bail!("CERTDESK_MAX_WORKSPACES must be at least 1");
        }
        Ok(())
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value `{}` for {}", raw, key)),
        None => Ok(None),
    }
}

fn millis<F>(lookup: &F, key: &str) -> anyhow::Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse::<u64, F>(lookup, key)?.map(Duration::from_millis))
}
