//! CLI argument definitions using clap
//!
//! Commands:
//! - formflow build --data <path> [--rules <path>] [--messages <path>]
//! - formflow encode [--config <path>] [--key <key>] <file>
//! - formflow decode [--config <path>] [--key <key>] <token>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// formflow - declarative form trees, error aggregation and search tokens
#[derive(Parser, Debug)]
#[command(name = "formflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a form from a data file and report its validity
    Build {
        /// JSON data the form is built from
        #[arg(long)]
        data: PathBuf,

        /// Validator spec document
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Message spec document
        #[arg(long)]
        messages: Option<PathBuf>,
    },

    /// Encode search criteria from a JSON file into a search token
    Encode {
        /// Flow configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Signing key, overrides the configuration
        #[arg(long)]
        key: Option<String>,

        /// JSON file holding the criteria
        file: PathBuf,
    },

    /// Decode a search token and print its criteria
    Decode {
        /// Flow configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Signing key, overrides the configuration
        #[arg(long)]
        key: Option<String>,

        token: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from([
            "formflow", "build", "--data", "d.json", "--rules", "r.json",
        ])
        .unwrap();
        match cli.command {
            Command::Build {
                data,
                rules,
                messages,
            } => {
                assert_eq!(data, PathBuf::from("d.json"));
                assert_eq!(rules, Some(PathBuf::from("r.json")));
                assert!(messages.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_decode_with_key() {
        let cli = Cli::try_parse_from(["formflow", "decode", "--key", "k", "abc.def.ghi"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Decode { ref key, ref token, .. }
                if key.as_deref() == Some("k") && token == "abc.def.ghi"
        ));
    }

    #[test]
    fn test_build_requires_data() {
        assert!(Cli::try_parse_from(["formflow", "build"]).is_err());
    }
}
