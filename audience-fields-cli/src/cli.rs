//! CLI definition for the audience-fields command-line interface.
//!
//! Only depends on `clap` and `std`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// audience-fields - resolve the fields an audience export can carry
#[derive(Parser, Debug)]
#[command(name = "audience-fields")]
#[command(version)]
#[command(about = "Resolve audience export fields per service, use case and target")]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file extending the built-in catalog (.toml, .yaml, .yml, .json)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show available, default and required fields for one context
    Resolve {
        /// Destination service, e.g. mailchimp
        #[arg(short, long, default_value = "default")]
        service: String,
        /// Use case: email, postal, tele_marketing or generic
        #[arg(short, long, default_value = "generic")]
        use_case: String,
        /// Target schema: b2b, b2c or both
        #[arg(short, long, default_value = "both")]
        target: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print every field definition in the catalog
    Catalog {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List services and their default fields
    Services,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resolve_defaults() {
        let cli = Cli::try_parse_from(["audience-fields", "resolve"]).unwrap();
        match cli.command {
            Commands::Resolve {
                service,
                use_case,
                target,
                json,
            } => {
                assert_eq!(service, "default");
                assert_eq!(use_case, "generic");
                assert_eq!(target, "both");
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "audience-fields",
            "services",
            "--debug",
            "--config",
            "fields.toml",
        ])
        .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("fields.toml")));
        assert!(matches!(cli.command, Commands::Services));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["audience-fields"]).is_err());
    }
}
