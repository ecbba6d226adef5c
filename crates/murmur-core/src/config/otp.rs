//! One-time passcode configuration.

use serde::{Deserialize, Serialize};

/// OTP challenge and rate-limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    /// Lifetime of an issued code.
    #[serde(default = "default_code_ttl")]
    pub code_ttl_seconds: u64,
    /// Failed verifications allowed before the challenge is discarded.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Codes that may be requested per identifier per window.
    #[serde(default = "default_identifier_limit")]
    pub identifier_limit: u32,
    /// Per-identifier window length.
    #[serde(default = "default_identifier_window")]
    pub identifier_window_seconds: u64,
    /// Codes that may be requested per client address per window.
    #[serde(default = "default_address_limit")]
    pub address_limit: u32,
    /// Per-address window length.
    #[serde(default = "default_address_window")]
    pub address_window_seconds: u64,
    /// Interval of the expired-challenge sweep. `0` disables it.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_ttl_seconds: default_code_ttl(),
            max_attempts: default_max_attempts(),
            identifier_limit: default_identifier_limit(),
            identifier_window_seconds: default_identifier_window(),
            address_limit: default_address_limit(),
            address_window_seconds: default_address_window(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_code_ttl() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    3
}

fn default_identifier_limit() -> u32 {
    3
}

fn default_identifier_window() -> u64 {
    3600
}

fn default_address_limit() -> u32 {
    5
}

fn default_address_window() -> u64 {
    60
}

fn default_sweep_interval() -> u64 {
    300
}
