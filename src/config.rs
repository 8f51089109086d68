//! Configuration
//!
//! Everything the pipeline needs is carried in `CentileConfig` and handed to
//! the handler explicitly. Values come from the environment; the form field
//! mapping is a JSON file named by `AUTOCENTILE_FIELD_MAP`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::MeasurementMethod;

pub const DEFAULT_API_BASE_URL: &str = "https://api.rcpch.ac.uk/growth/v1";

pub const ENV_API_URL: &str = "AUTOCENTILE_API_URL";
pub const ENV_API_KEY: &str = "AUTOCENTILE_API_KEY";
pub const ENV_REFERENCE: &str = "AUTOCENTILE_REFERENCE";
pub const ENV_FIELD_MAP: &str = "AUTOCENTILE_FIELD_MAP";
pub const ENV_STRICT_DATES: &str = "AUTOCENTILE_STRICT_DATES";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown growth reference: {0} (expected uk-who, trisomy-21 or turners-syndrome)")]
    UnknownReference(String),

    #[error("Failed to read field map {path}: {source}")]
    FieldMapRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse field map {path}: {source}")]
    FieldMapParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Growth reference dataset, selecting the API endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrowthReference {
    #[default]
    UkWho,
    Trisomy21,
    TurnersSyndrome,
}

impl GrowthReference {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthReference::UkWho => "uk-who",
            GrowthReference::Trisomy21 => "trisomy-21",
            GrowthReference::TurnersSyndrome => "turners-syndrome",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "uk-who" | "ukwho" => Some(GrowthReference::UkWho),
            "trisomy-21" | "trisomy21" => Some(GrowthReference::Trisomy21),
            "turners-syndrome" | "turner" | "turners" => Some(GrowthReference::TurnersSyndrome),
            _ => None,
        }
    }
}

/// Form field names, as configured for the data entry project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    /// Comma-separated instrument names the calculator runs on
    pub target_instruments: Option<String>,

    pub weight_field: Option<String>,
    pub height_field: Option<String>,
    pub ofc_field: Option<String>,
    pub dob_field: Option<String>,
    pub sex_field: Option<String>,
    pub measurement_date_field: Option<String>,
    pub gestation_weeks_field: Option<String>,
    pub gestation_days_field: Option<String>,

    /// Validation types of the date fields (e.g. "date_dmy"), used as parse hints
    pub dob_validation: Option<String>,
    pub measurement_date_validation: Option<String>,

    pub weight_centile_field: Option<String>,
    pub height_centile_field: Option<String>,
    pub bmi_centile_field: Option<String>,
    pub ofc_centile_field: Option<String>,
    pub weight_sds_field: Option<String>,
    pub height_sds_field: Option<String>,
    pub bmi_sds_field: Option<String>,
    pub ofc_sds_field: Option<String>,
}

fn configured(name: &Option<String>) -> Option<&str> {
    name.as_deref().map(str::trim).filter(|n| !n.is_empty())
}

impl FieldMapping {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::FieldMapRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::FieldMapParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn weight(&self) -> Option<&str> {
        configured(&self.weight_field)
    }

    pub fn height(&self) -> Option<&str> {
        configured(&self.height_field)
    }

    pub fn ofc(&self) -> Option<&str> {
        configured(&self.ofc_field)
    }

    pub fn dob(&self) -> Option<&str> {
        configured(&self.dob_field)
    }

    pub fn sex(&self) -> Option<&str> {
        configured(&self.sex_field)
    }

    pub fn measurement_date(&self) -> Option<&str> {
        configured(&self.measurement_date_field)
    }

    pub fn gestation_weeks(&self) -> Option<&str> {
        configured(&self.gestation_weeks_field)
    }

    pub fn gestation_days(&self) -> Option<&str> {
        configured(&self.gestation_days_field)
    }

    /// Centile and SDS output fields for a measurement method
    pub fn outputs(&self, method: MeasurementMethod) -> (Option<&str>, Option<&str>) {
        let (centile, sds) = match method {
            MeasurementMethod::Weight => (&self.weight_centile_field, &self.weight_sds_field),
            MeasurementMethod::Height => (&self.height_centile_field, &self.height_sds_field),
            MeasurementMethod::Bmi => (&self.bmi_centile_field, &self.bmi_sds_field),
            MeasurementMethod::Ofc => (&self.ofc_centile_field, &self.ofc_sds_field),
        };
        (configured(centile), configured(sds))
    }
}

fn flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Pipeline configuration
#[derive(Clone)]
pub struct CentileConfig {
    pub api_base_url: String,
    pub reference: GrowthReference,
    pub api_key: Option<String>,
    /// Reject dates that only the permissive fallback can parse
    pub strict_dates: bool,
    pub fields: FieldMapping,
}

impl Default for CentileConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            reference: GrowthReference::default(),
            api_key: None,
            strict_dates: false,
            fields: FieldMapping::default(),
        }
    }
}

// Keeps the API key out of logs
impl fmt::Debug for CentileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CentileConfig")
            .field("api_base_url", &self.api_base_url)
            .field("reference", &self.reference)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("strict_dates", &self.strict_dates)
            .field("fields", &self.fields)
            .finish()
    }
}

impl CentileConfig {
    /// Load from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let reference = match get(ENV_REFERENCE) {
            Some(name) => {
                GrowthReference::from_str(&name).ok_or(ConfigError::UnknownReference(name))?
            }
            None => GrowthReference::default(),
        };

        let fields = match get(ENV_FIELD_MAP) {
            Some(path) => FieldMapping::load(Path::new(&path))?,
            None => FieldMapping::default(),
        };

        Ok(Self {
            api_base_url: get(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            reference,
            api_key: get(ENV_API_KEY),
            strict_dates: get(ENV_STRICT_DATES).is_some_and(|v| flag(&v)),
            fields,
        })
    }

    /// Calculation endpoint for the configured reference
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/calculation",
            self.api_base_url.trim_end_matches('/'),
            self.reference.as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CentileConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.endpoint(), "https://api.rcpch.ac.uk/growth/v1/uk-who/calculation");
        assert_eq!(config.api_key, None);
        assert!(!config.strict_dates);
        assert_eq!(config.fields, FieldMapping::default());
    }

    #[test]
    fn test_overrides() {
        let config = CentileConfig::from_lookup(lookup(&[
            (ENV_API_URL, "http://localhost:8000/"),
            (ENV_REFERENCE, "trisomy_21"),
            (ENV_API_KEY, " abc123 "),
        ]))
        .unwrap();
        assert_eq!(config.endpoint(), "http://localhost:8000/trisomy-21/calculation");
        assert_eq!(config.api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_strict_dates_flag() {
        for (value, expected) in [("1", true), ("TRUE", true), ("on", true), ("0", false), ("no", false)] {
            let config = CentileConfig::from_lookup(lookup(&[(ENV_STRICT_DATES, value)])).unwrap();
            assert_eq!(config.strict_dates, expected, "{} = {}", ENV_STRICT_DATES, value);
        }
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let config = CentileConfig::from_lookup(lookup(&[(ENV_API_KEY, "   ")])).unwrap();
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn test_unknown_reference() {
        let err = CentileConfig::from_lookup(lookup(&[(ENV_REFERENCE, "cdc")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownReference(r) if r == "cdc"));
    }

    #[test]
    fn test_missing_field_map_file() {
        let err = CentileConfig::from_lookup(lookup(&[(ENV_FIELD_MAP, "/nonexistent/fields.json")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::FieldMapRead { .. }));
    }

    #[test]
    fn test_field_map_file() {
        let path = std::env::temp_dir().join(format!("autocentile-fields-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"dob_field": "dob", "weight_field": "wt", "weight_centile_field": "wt_cent", "bmi_sds_field": " "}"#,
        )
        .unwrap();

        let config =
            CentileConfig::from_lookup(lookup(&[(ENV_FIELD_MAP, path.to_str().unwrap())])).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.fields.dob(), Some("dob"));
        assert_eq!(config.fields.weight(), Some("wt"));
        assert_eq!(config.fields.outputs(MeasurementMethod::Weight), (Some("wt_cent"), None));
        assert_eq!(config.fields.outputs(MeasurementMethod::Bmi), (None, None));
    }

    #[test]
    fn test_invalid_field_map_file() {
        let path = std::env::temp_dir().join(format!("autocentile-bad-{}.json", std::process::id()));
        std::fs::write(&path, "dob_field = dob").unwrap();
        let err = CentileConfig::from_lookup(lookup(&[(ENV_FIELD_MAP, path.to_str().unwrap())]))
            .unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::FieldMapParse { .. }));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = CentileConfig {
            api_key: Some("super-secret".into()),
            ..Default::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
