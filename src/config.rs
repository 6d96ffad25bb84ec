use std::net::SocketAddr;

use anyhow::Context;
use time::{macros::format_description, UtcOffset};

use crate::meals::slot::ServiceHours;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Offset used for "today" and for meal slot decisions.
    pub utc_offset: UtcOffset,
    pub service_hours: ServiceHours,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);
        let utc_offset = match std::env::var("APP_UTC_OFFSET") {
            Ok(raw) => parse_utc_offset(&raw)?,
            Err(_) => UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        };
        Ok(Self {
            database_url,
            db_max_connections,
            host,
            port,
            utc_offset,
            service_hours: ServiceHours::default(),
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

/// Parses offsets written as `+01:00` / `-05:30`.
pub fn parse_utc_offset(raw: &str) -> anyhow::Result<UtcOffset> {
    let fmt = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    UtcOffset::parse(raw.trim(), fmt).with_context(|| format!("invalid APP_UTC_OFFSET {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signed_offsets() {
        assert_eq!(
            parse_utc_offset("+01:00").unwrap(),
            UtcOffset::from_hms(1, 0, 0).unwrap()
        );
        assert_eq!(
            parse_utc_offset(" -05:30 ").unwrap(),
            UtcOffset::from_hms(-5, -30, 0).unwrap()
        );
    }

    #[test]
    fn rejects_unsigned_offset() {
        assert!(parse_utc_offset("01:00").is_err());
        assert!(parse_utc_offset("lagos").is_err());
    }
}
