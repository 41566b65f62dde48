// src/config.rs
//! Runtime configuration.
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. Optional `config/credential-lifecycle.{toml,json,yaml}` file
//! 3. `CREDLIFE`-prefixed environment variables, `__` separating nested keys
//!    (e.g. `CREDLIFE__VERIFIER__NONCE_TTL_SECS=60`), after `.env` is loaded

use chrono::Duration;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_ISSUER_URL: &str = "https://oxford.com/issuers/1"; // This is a fake URL.
pub const DEFAULT_ISSUER_NAME: &str = "The Marvelous University of Oxford";
pub const DEFAULT_NONCE_TTL_SECS: i64 = 300;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IssuerSettings {
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VerifierSettings {
    /// Seconds an issued nonce stays presentable. `0` disables expiry.
    pub nonce_ttl_secs: u64,
}

impl VerifierSettings {
    pub fn nonce_ttl(&self) -> Option<Duration> {
        match self.nonce_ttl_secs {
            0 => None,
            secs => {
                let secs = i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1_000);
                Some(Duration::seconds(secs))
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct DemoSettings {
    /// Seed for a reproducible demo run. Never set this outside of demos.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub issuer: IssuerSettings,
    pub verifier: VerifierSettings,
    #[serde(default)]
    pub demo: DemoSettings,
}

/// Defaults plus the optional config file, without environment overrides.
pub(crate) fn base_builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("issuer.url", DEFAULT_ISSUER_URL)?
        .set_default("issuer.name", DEFAULT_ISSUER_NAME)?
        .set_default("verifier.nonce_ttl_secs", DEFAULT_NONCE_TTL_SECS)?
        .add_source(File::with_name("config/credential-lifecycle").required(false)))
}

/// `CREDLIFE__SECTION__KEY` variables, numbers parsed.
fn environment() -> Environment {
    Environment::with_prefix("CREDLIFE")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    /// Loads `.env`, then layers defaults, config file and environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        base_builder()?
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings: Settings = base_builder().unwrap().build().unwrap().try_deserialize().unwrap();
        assert_eq!(settings.issuer.url, DEFAULT_ISSUER_URL);
        assert_eq!(settings.issuer.name, DEFAULT_ISSUER_NAME);
        assert_eq!(settings.verifier.nonce_ttl_secs, 300);
        assert_eq!(settings.demo.seed, None);
        assert_eq!(settings.verifier.nonce_ttl(), Some(Duration::seconds(300)));
    }

    #[test]
    fn test_overrides() {
        let settings: Settings = base_builder()
            .unwrap()
            .set_override("issuer.name", "Cambridge")
            .unwrap()
            .set_override("verifier.nonce_ttl_secs", 0i64)
            .unwrap()
            .set_override("demo.seed", 42i64)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.issuer.name, "Cambridge");
        assert_eq!(settings.verifier.nonce_ttl(), None);
        assert_eq!(settings.demo.seed, Some(42));
    }

    #[test]
    fn test_environment_layer() {
        let vars: config::Map<String, String> = [
            ("CREDLIFE__VERIFIER__NONCE_TTL_SECS", "45"),
            ("CREDLIFE__ISSUER__NAME", "Cambridge"),
            ("OTHER__ISSUER__URL", "https://elsewhere.example"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let settings: Settings = base_builder()
            .unwrap()
            .add_source(environment().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.verifier.nonce_ttl_secs, 45);
        assert_eq!(settings.verifier.nonce_ttl(), Some(Duration::seconds(45)));
        assert_eq!(settings.issuer.name, "Cambridge");
        assert_eq!(settings.issuer.url, DEFAULT_ISSUER_URL);
    }

    #[test]
    fn test_load_reads_process_environment() {
        std::env::set_var("CREDLIFE__VERIFIER__NONCE_TTL_SECS", "90");
        let settings = Settings::load().unwrap();
        std::env::remove_var("CREDLIFE__VERIFIER__NONCE_TTL_SECS");
        assert_eq!(settings.verifier.nonce_ttl_secs, 90);
    }
}
