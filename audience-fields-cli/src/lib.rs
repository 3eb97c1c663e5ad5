//! audience-fields CLI - inspect the field catalog from the command line.
//!
//! Commands:
//! - `audience-fields resolve -s SERVICE -u USE_CASE -t TARGET [--json]`
//! - `audience-fields catalog [--json]`
//! - `audience-fields services`
//!
//! Every command reads the built-in catalog extended by `--config` and the
//! `AUDIENCE_FIELDS_*` environment variables.

pub mod cli;
pub mod list;
pub mod resolve;

pub use cli::{Cli, Commands};

use std::path::Path;

use anyhow::Context;
use audience_fields::{FieldCatalog, FieldContext, FieldsConfig};

/// The built-in catalog with configuration applied.
pub fn load_catalog(config: Option<&Path>) -> anyhow::Result<FieldCatalog> {
    let config = FieldsConfig::load(config).context("failed to load fields configuration")?;
    Ok(config.catalog())
}

/// Run a parsed command against a catalog.
pub fn run_command(command: Commands, catalog: &FieldCatalog) -> anyhow::Result<()> {
    match command {
        Commands::Resolve {
            service,
            use_case,
            target,
            json,
        } => resolve::run_resolve(
            catalog,
            FieldContext::new(service, use_case.as_str(), target.as_str()),
            json,
        ),
        Commands::Catalog { json } => list::run_catalog(catalog, json),
        Commands::Services => list::run_services(catalog),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn load_catalog_without_config_is_builtin() {
        assert_eq!(load_catalog(None).unwrap(), FieldCatalog::builtin());
    }

    #[test]
    #[serial]
    fn load_catalog_reports_bad_config() {
        let tmp = TempDir::new().unwrap();
        let err = load_catalog(Some(&tmp.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("fields configuration"));
    }

    #[test]
    #[serial]
    fn load_catalog_applies_config_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fields.json");
        std::fs::write(&path, r#"{"service_defaults": {"braze": ["email"]}}"#).unwrap();
        let catalog = load_catalog(Some(&path)).unwrap();
        assert!(catalog.has_service("braze"));
    }

    #[test]
    fn every_command_runs_on_builtin_catalog() {
        let catalog = FieldCatalog::builtin();
        for command in [
            Commands::Resolve {
                service: "klaviyo".into(),
                use_case: "tele_marketing".into(),
                target: "b2c".into(),
                json: true,
            },
            Commands::Catalog { json: false },
            Commands::Services,
        ] {
            run_command(command, &catalog).unwrap();
        }
    }
}
