//! CLI module for formflow
//!
//! Provides command-line interface for:
//! - build: Build a form from JSON files and report its errors
//! - encode: Turn search criteria into a search token
//! - decode: Turn a search token back into criteria

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{build, build_report, decode, encode, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{ok_response, read_json_file, write_response};
