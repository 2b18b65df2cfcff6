use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_free_baggage")]
    pub free_baggage_kg: u32,
    #[serde(default = "default_baggage_rate")]
    pub extra_baggage_rate_cents: i64,
    #[serde(default = "default_max_baggage")]
    pub max_baggage_kg: u32,
    /// Balance of a blocked booking is due this long before departure
    #[serde(default = "default_deposit_due")]
    pub deposit_due_hours: i64,
    /// Passenger cancellations are refused inside this window
    #[serde(default = "default_cancellation_cutoff")]
    pub cancellation_cutoff_hours: i64,
    #[serde(default = "default_sweep")]
    pub expiry_sweep_seconds: u64,
}

fn default_free_baggage() -> u32 { 23 }
fn default_baggage_rate() -> i64 { 1500 }
fn default_max_baggage() -> u32 { 50 }
fn default_deposit_due() -> i64 { 48 }
fn default_cancellation_cutoff() -> i64 { 24 }
fn default_sweep() -> u64 { 60 }

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            free_baggage_kg: default_free_baggage(),
            extra_baggage_rate_cents: default_baggage_rate(),
            max_baggage_kg: default_max_baggage(),
            deposit_due_hours: default_deposit_due(),
            cancellation_cutoff_hours: default_cancellation_cutoff(),
            expiry_sweep_seconds: default_sweep(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    pub enabled: bool,
    pub random_occupancy: bool,
    pub rng_seed: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            random_occupancy: true,
            rng_seed: 42,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local, uncommitted overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `SKYWINGS__SERVER__PORT=9000` overrides `server.port`
            .add_source(config::Environment::with_prefix("SKYWINGS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
