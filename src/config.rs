use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::scoring::DEFAULT_POINTS_PER_UNIT;
use crate::models::{DistanceFormula, MatchPolicy, DEFAULT_RADIUS_KM};
use crate::services::DocumentStoreTarget;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub store: StoreSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub donations: DonationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// CSV file with one food bank per row
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,
    pub max_results: Option<usize>,
    #[serde(default)]
    pub formula: DistanceFormula,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_radius_km: default_radius_km(),
            max_results: None,
            formula: DistanceFormula::default(),
        }
    }
}

impl MatchingSettings {
    pub fn policy(&self) -> MatchPolicy {
        MatchPolicy {
            default_radius_km: self.default_radius_km,
            max_results: self.max_results,
            formula: self.formula,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DonationSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_database_id")]
    pub database_id: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_facility_collection")]
    pub facility_collection: String,
    pub api_key: Option<String>,
    #[serde(default = "default_points_per_unit")]
    pub points_per_unit: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DonationSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            project_id: String::new(),
            database_id: default_database_id(),
            collection: default_collection(),
            facility_collection: default_facility_collection(),
            api_key: None,
            points_per_unit: default_points_per_unit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DonationSettings {
    pub fn target(&self) -> DocumentStoreTarget {
        DocumentStoreTarget {
            endpoint: self.endpoint.clone(),
            project_id: self.project_id.clone(),
            database_id: self.database_id.clone(),
            collection: self.collection.clone(),
            facility_collection: self.facility_collection.clone(),
            api_key: self.api_key.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_radius_km() -> f64 { DEFAULT_RADIUS_KM }
fn default_endpoint() -> String { "https://firestore.googleapis.com/v1".to_string() }
fn default_database_id() -> String { "(default)".to_string() }
fn default_collection() -> String { "food_requests".to_string() }
fn default_facility_collection() -> String { "food_banks".to_string() }
fn default_points_per_unit() -> u32 { DEFAULT_POINTS_PER_UNIT }
fn default_timeout_secs() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with LOCATOR_)
    /// 5. `FOODBANK_CSV` and `FIREBASE_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., LOCATOR__MATCHING__DEFAULT_RADIUS_KM -> matching.default_radius_km
            .add_source(environment())
            .build()?;

        apply_env_fallbacks(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        apply_env_fallbacks(settings)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("LOCATOR")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Honor the plain variable names used by existing deployments
fn apply_env_fallbacks(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(path) = env::var("FOODBANK_CSV") {
        builder = builder.set_override("store.path", path)?;
    }
    if let Ok(api_key) = env::var("FIREBASE_API_KEY") {
        builder = builder.set_override("donations.api_key", api_key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matching() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.default_radius_km, 50.0);
        assert_eq!(matching.max_results, None);
        assert_eq!(matching.policy().formula, DistanceFormula::Geodesic);
    }

    #[test]
    fn test_default_donations() {
        let donations = DonationSettings::default();
        assert_eq!(donations.points_per_unit, 10);
        assert_eq!(donations.collection, "food_requests");
        assert_eq!(donations.target().facility_collection, "food_banks");
        assert_eq!(donations.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "compact");
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: Settings = Config::builder()
            .add_source(config::File::from_str(
                r#"
                [store]
                path = "data/foodbanks.csv"

                [matching]
                default_radius_km = 25.0
                formula = "haversine"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.store.path, PathBuf::from("data/foodbanks.csv"));
        assert_eq!(settings.matching.default_radius_km, 25.0);
        assert_eq!(settings.matching.formula, DistanceFormula::Haversine);
        assert_eq!(settings.donations.points_per_unit, 10);
        assert_eq!(settings.logging.level, "info");
    }
}
