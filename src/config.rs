use std::{env, str::FromStr};

use anyhow::{Context, bail};
use chrono::Duration;

use crate::order_number::MAX_WORKER_ID;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub order_number_worker_id: u16,
    pub sweep: SweepConfig,
}

/// Timing of the two order reconciliation sweeps.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Unpaid orders older than this are cancelled.
    pub payment_timeout: Duration,
    /// Orders out for delivery longer than this are completed.
    pub delivery_grace: Duration,
    pub timeout_sweep_interval: std::time::Duration,
    /// UTC hour at which the delivery sweep runs once a day.
    pub delivery_sweep_hour: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            payment_timeout: Duration::minutes(15),
            delivery_grace: Duration::minutes(60),
            timeout_sweep_interval: std::time::Duration::from_secs(60),
            delivery_sweep_hour: 1,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("APP_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let order_number_worker_id = parse_or(&lookup, "ORDER_NUMBER_WORKER_ID", 0u16)?;
        if order_number_worker_id > MAX_WORKER_ID {
            bail!("ORDER_NUMBER_WORKER_ID must be at most {MAX_WORKER_ID}");
        }

        let defaults = SweepConfig::default();
        let payment_timeout = parse_or(
            &lookup,
            "PAYMENT_TIMEOUT_MINUTES",
            defaults.payment_timeout.num_minutes(),
        )?;
        let delivery_grace = parse_or(
            &lookup,
            "DELIVERY_GRACE_MINUTES",
            defaults.delivery_grace.num_minutes(),
        )?;
        let interval_secs = parse_or(
            &lookup,
            "TIMEOUT_SWEEP_INTERVAL_SECS",
            defaults.timeout_sweep_interval.as_secs(),
        )?;
        let delivery_sweep_hour =
            parse_or(&lookup, "DELIVERY_SWEEP_HOUR", defaults.delivery_sweep_hour)?;

        if payment_timeout < 0 || delivery_grace < 0 {
            bail!("sweep thresholds must not be negative");
        }
        if interval_secs == 0 {
            bail!("TIMEOUT_SWEEP_INTERVAL_SECS must be positive");
        }
        if delivery_sweep_hour > 23 {
            bail!("DELIVERY_SWEEP_HOUR must be between 0 and 23");
        }

        Ok(Self {
            database_url,
            host,
            port,
            order_number_worker_id,
            sweep: SweepConfig {
                payment_timeout: Duration::minutes(payment_timeout),
                delivery_grace: Duration::minutes(delivery_grace),
                timeout_sweep_interval: std::time::Duration::from_secs(interval_secs),
                delivery_sweep_hour,
            },
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw}")),
        None => Ok(default),
    }
}
