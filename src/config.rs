use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::model::shift::parse_time_of_day;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_attendance_per_min: u32,

    // Outbound collaborators
    pub geocoder_url: String,
    pub geocoder_timeout: Duration,
    pub geocode_cache_ttl: Duration,
    /// Face matching is disabled when unset.
    pub face_match_url: Option<String>,
    pub face_match_timeout: Duration,

    // Sweeps
    pub sweeps_enabled: bool,
    pub auto_checkout_every: Duration,
    pub absent_sweep_at: NaiveTime,
    pub payroll_run_at: NaiveTime,
    pub payroll_concurrency: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,
            rate_attendance_per_min: parse_or(&lookup, "RATE_ATTENDANCE_PER_MIN", 60)?,

            geocoder_url: lookup("GEOCODER_URL")
                .unwrap_or_else(|| "https://nominatim.openstreetmap.org".to_string()),
            geocoder_timeout: Duration::from_secs(parse_or(&lookup, "GEOCODER_TIMEOUT_SECS", 5)?),
            geocode_cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "GEOCODE_CACHE_TTL_SECS",
                86_400,
            )?),
            face_match_url: lookup("FACE_MATCH_URL").filter(|s| !s.trim().is_empty()),
            face_match_timeout: Duration::from_secs(parse_or(&lookup, "FACE_MATCH_TIMEOUT_SECS", 10)?),

            sweeps_enabled: parse_or(&lookup, "SWEEPS_ENABLED", true)?,
            auto_checkout_every: Duration::from_secs(
                parse_or::<u64>(&lookup, "AUTO_CHECKOUT_EVERY_SECS", 60)?.max(1),
            ),
            absent_sweep_at: time_or(&lookup, "ABSENT_SWEEP_AT", "00:05")?,
            payroll_run_at: time_or(&lookup, "PAYROLL_RUN_AT", "00:10")?,
            payroll_concurrency: parse_or(&lookup, "PAYROLL_CONCURRENCY", 8)?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value {raw:?}")),
        None => Ok(default),
    }
}

fn time_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> anyhow::Result<NaiveTime> {
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    parse_time_of_day(&raw).ok_or_else(|| anyhow!("{key} has an invalid time {raw:?}"))
}
