use std::env;
use std::net::SocketAddr;

use chrono::FixedOffset;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Time zone whose calendar day decides whether an assignment is still due.
    pub reference_offset: FixedOffset,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://homework.db".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8005".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::BadRequest(format!("BIND_ADDR is invalid: {}", e)))?;

        let offset_minutes = match env::var("TZ_OFFSET_MINUTES") {
            Ok(raw) => raw
                .parse::<i32>()
                .map_err(|e| AppError::BadRequest(format!("TZ_OFFSET_MINUTES is invalid: {}", e)))?,
            Err(_) => 0,
        };
        let reference_offset = offset_from_minutes(offset_minutes)?;

        Ok(Self {
            database_url,
            bind_addr,
            reference_offset,
        })
    }
}

pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, AppError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| AppError::BadRequest(format!("UTC offset out of range: {} minutes", minutes)))
}
