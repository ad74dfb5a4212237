use serde::{Deserialize, Serialize};

use crate::utils::constants::{DEFAULT_API_URL, DEFAULT_CACHE_VERSION, DEFAULT_SYNC_INTERVAL_SECS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Endpoint compilado; el usuario puede guardar otro en localStorage
    pub default_api_url: String,
    pub environment: String,
    pub enable_logging: bool,
    pub retry: RetryPolicy,
    pub cache_version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_api_url: DEFAULT_API_URL.to_string(),
            environment: "production".to_string(),
            enable_logging: true,
            retry: RetryPolicy::default(),
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
        }
    }
}

/// Política de reintento de la cola
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Periodo del timer de sincronización
    pub interval_secs: u32,
    /// `None`: se reintenta en cada tick, sin límite
    pub backoff: Option<BackoffPolicy>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            backoff: None,
        }
    }
}

impl RetryPolicy {
    pub fn interval_ms(&self) -> u32 {
        self.interval_secs.saturating_mul(1000)
    }
}

/// Backoff exponencial entre drains fallidos: base, 2*base, 4*base... hasta max
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    pub base_secs: u32,
    pub max_secs: u32,
}

impl BackoffPolicy {
    /// Espera tras `failures` drains fallidos seguidos
    pub fn delay_secs(&self, failures: u32) -> u32 {
        if failures == 0 {
            return 0;
        }
        let factor = 2u32.saturating_pow(failures - 1);
        self.base_secs.saturating_mul(factor).min(self.max_secs)
    }
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno en tiempo de compilación
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let backoff = match (
            parse_env(option_env!("BODEGA_BACKOFF_BASE_SECS")),
            parse_env(option_env!("BODEGA_BACKOFF_MAX_SECS")),
        ) {
            (Some(base_secs), max) if base_secs > 0 => Some(BackoffPolicy {
                base_secs,
                max_secs: max.unwrap_or(300).max(base_secs),
            }),
            _ => None,
        };

        Self {
            default_api_url: defaults.default_api_url,
            environment: option_env!("BODEGA_ENVIRONMENT")
                .unwrap_or("production")
                .to_string(),
            enable_logging: parse_env(option_env!("BODEGA_ENABLE_LOGGING")).unwrap_or(true),
            retry: RetryPolicy {
                interval_secs: parse_env(option_env!("BODEGA_SYNC_INTERVAL_SECS"))
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_SYNC_INTERVAL_SECS),
                backoff,
            },
            cache_version: option_env!("BODEGA_CACHE_VERSION")
                .unwrap_or(DEFAULT_CACHE_VERSION)
                .to_string(),
        }
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.enable_logging
    }
}

fn parse_env<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

// Configuración global estática
lazy_static::lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}
