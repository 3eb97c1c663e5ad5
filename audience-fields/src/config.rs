//! Layered configuration that extends the built-in catalog.
//!
//! Sources are merged in precedence order (later overrides earlier):
//! 1. Serialized defaults (empty extensions)
//! 2. An optional config file: `.toml`, `.yaml`/`.yml` or `.json`
//! 3. Environment variables prefixed `AUDIENCE_FIELDS_`, nested with `__`
//!
//! ```toml
//! [service_defaults]
//! acme = ["email", "phone"]
//!
//! [[extra_fields]]
//! key = "loyalty_tier"
//! label = "Loyalty Tier"
//! type = "string"
//! category = "enrichment"
//!
//! [[required]]
//! use_case = "generic"
//! target = "b2c"
//! keys = ["email"]
//! ```

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{FieldCatalog, RequiredRule};
use crate::error::{FieldsError, Result};
use crate::types::FieldSpec;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "AUDIENCE_FIELDS_";

/// Catalog extensions read from configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldsConfig {
    /// Fields appended after the built-in ones.
    #[serde(default)]
    pub extra_fields: Vec<FieldSpec>,
    /// Service default keys; replaces a built-in entry of the same name.
    #[serde(default)]
    pub service_defaults: IndexMap<String, Vec<String>>,
    /// Required rules; replaces the built-in rule of the same combination.
    #[serde(default)]
    pub required: Vec<RequiredRule>,
}

impl FieldsConfig {
    /// Load from defaults, the optional file, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: FieldsConfig = Self::figment(path)?.extract()?;
        debug!(
            extra_fields = config.extra_fields.len(),
            services = config.service_defaults.len(),
            required = config.required.len(),
            "fields configuration loaded"
        );
        Ok(config)
    }

    /// Build the figment with every source in precedence order.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(FieldsConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(file_provider(path)?);
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Apply the extensions to a catalog.
    pub fn apply(&self, catalog: &mut FieldCatalog) {
        catalog.add_fields(self.extra_fields.iter().cloned());
        for (service, keys) in &self.service_defaults {
            catalog.set_service_defaults(service.clone(), keys.clone());
        }
        for rule in &self.required {
            catalog.set_required(rule.clone());
        }
    }

    /// The built-in catalog with these extensions applied.
    pub fn catalog(&self) -> FieldCatalog {
        let mut catalog = FieldCatalog::builtin();
        catalog.extend(self);
        catalog
    }
}

fn file_provider(path: &Path) -> Result<Figment> {
    if !path.is_file() {
        return Err(FieldsError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let figment = match extension.as_deref() {
        Some("toml") => Figment::from(Toml::file(path)),
        Some("yaml") | Some("yml") => Figment::from(Yaml::file(path)),
        Some("json") => Figment::from(Json::file(path)),
        _ => {
            return Err(FieldsError::UnsupportedFormat {
                path: PathBuf::from(path),
            })
        }
    };
    debug!(?path, "loading fields configuration file");
    Ok(figment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldContext, TargetSchema, UseCase};
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn no_sources_gives_empty_config() {
        let config = FieldsConfig::load(None).unwrap();
        assert_eq!(config, FieldsConfig::default());
        assert_eq!(config.catalog(), FieldCatalog::builtin());
    }

    #[test]
    #[serial]
    fn toml_file_extends_catalog() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fields.toml");
        fs::write(
            &path,
            r#"
[service_defaults]
acme = ["email", "loyalty_tier"]

[[extra_fields]]
key = "loyalty_tier"
label = "Loyalty Tier"
type = "string"
supported_use_cases = ["generic"]
category = "enrichment"

[[required]]
use_case = "generic"
target = "b2c"
keys = ["email"]
"#,
        )
        .unwrap();

        let config = FieldsConfig::load(Some(&path)).unwrap();
        let catalog = config.catalog();
        assert_eq!(catalog.default_keys("acme"), ["email", "loyalty_tier"]);
        assert_eq!(
            catalog.required_keys(UseCase::Generic, TargetSchema::B2c),
            ["email"]
        );

        let ctx = FieldContext::new("acme", "generic", "b2c");
        let rows = crate::resolver::default_rows_for_service(&catalog, &ctx);
        assert_eq!(rows[1].label, "Loyalty Tier");
    }

    #[test]
    #[serial]
    fn yaml_file_is_supported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fields.yml");
        fs::write(
            &path,
            r#"
service_defaults:
  mailchimp: [email]
"#,
        )
        .unwrap();

        let catalog = FieldsConfig::load(Some(&path)).unwrap().catalog();
        assert_eq!(catalog.default_keys("mailchimp"), ["email"]);
    }

    #[test]
    #[serial]
    fn json_file_is_supported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fields.json");
        fs::write(&path, r#"{"service_defaults": {"zapier": ["email", "phone"]}}"#).unwrap();

        let catalog = FieldsConfig::load(Some(&path)).unwrap().catalog();
        assert_eq!(catalog.default_keys("zapier"), ["email", "phone"]);
    }

    #[test]
    #[serial]
    fn unsupported_extension_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fields.ini");
        fs::write(&path, "x=1").unwrap();

        let err = FieldsConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, FieldsError::UnsupportedFormat { .. }));
    }

    #[test]
    #[serial]
    fn missing_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let err = FieldsConfig::load(Some(&tmp.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, FieldsError::ConfigNotFound { .. }));
    }

    #[test]
    #[serial]
    fn malformed_file_is_a_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fields.toml");
        fs::write(&path, "service_defaults = 12").unwrap();

        let err = FieldsConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, FieldsError::Config(_)));
    }

    #[test]
    #[serial]
    fn environment_overrides_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fields.toml");
        fs::write(
            &path,
            r#"
[service_defaults]
acme = ["email"]
"#,
        )
        .unwrap();

        std::env::set_var("AUDIENCE_FIELDS_SERVICE_DEFAULTS__ACME", "[phone, email]");
        let result = FieldsConfig::load(Some(&path));
        std::env::remove_var("AUDIENCE_FIELDS_SERVICE_DEFAULTS__ACME");

        let catalog = result.unwrap().catalog();
        assert_eq!(catalog.default_keys("acme"), ["phone", "email"]);
    }
}
