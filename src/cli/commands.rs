//! CLI command implementations
//!
//! Every command returns its output as JSON; `run_command` writes it to
//! stdout inside the success envelope.

use std::path::Path;

use serde_json::{json, Value};

use crate::aggregator::first_error;
use crate::builder::{self, Form};
use crate::flow::FlowConfig;
use crate::observability::Logger;
use crate::spec::{parse_message_spec, parse_validator_spec};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_json_file, read_text_file, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    Logger::init_from_env();
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let output = match cmd {
        Command::Build {
            data,
            rules,
            messages,
        } => build(&data, rules.as_deref(), messages.as_deref())?,
        Command::Encode { config, key, file } => {
            encode(config.as_deref(), key.as_deref(), &file)?
        }
        Command::Decode { config, key, token } => {
            decode(config.as_deref(), key.as_deref(), &token)?
        }
    };
    write_response(output)
}

/// Build a form from files and report value, status and errors
pub fn build(
    data_path: &Path,
    rules_path: Option<&Path>,
    messages_path: Option<&Path>,
) -> CliResult<Value> {
    let data = read_json_file(data_path)?;

    let rules = match rules_path {
        Some(path) => Some(parse_validator_spec(&read_text_file(path)?)?),
        None => None,
    };
    let messages = match messages_path {
        Some(path) => Some(parse_message_spec(&read_text_file(path)?)?),
        None => None,
    };

    let form = builder::build(&data, rules.as_ref(), None, messages.as_ref())?;
    Ok(build_report(&form))
}

/// Report of a built form: the first own error of every node that has one
pub fn build_report(form: &Form) -> Value {
    let errors: Vec<Value> = form
        .controls()
        .into_iter()
        .filter_map(|(path, control)| {
            let errors = control.errors()?;
            let message = first_error(&errors, form.messages_for(&path))?;
            Some(json!({
                "path": path.to_string(),
                "code": message.code,
                "message": message.message,
            }))
        })
        .collect();

    json!({
        "value": form.value(),
        "status": form.status().as_str(),
        "errors": errors,
    })
}

/// Encode criteria from a JSON file into a search token
pub fn encode(config: Option<&Path>, key: Option<&str>, file: &Path) -> CliResult<Value> {
    let config = flow_config(config, key)?;
    let data = read_json_file(file)?;
    let token = config.codec()?.encode(&data)?;

    Ok(json!({
        "param": config.param_key,
        "token": token,
    }))
}

/// Decode a search token into its criteria
pub fn decode(config: Option<&Path>, key: Option<&str>, token: &str) -> CliResult<Value> {
    let config = flow_config(config, key)?;
    Ok(config.codec()?.decode(token)?)
}

fn flow_config(path: Option<&Path>, key: Option<&str>) -> CliResult<FlowConfig> {
    let config = match path {
        Some(path) => FlowConfig::load(path).map_err(CliError::from)?,
        None => FlowConfig::default(),
    };
    Ok(match key {
        Some(key) => config.with_token_key(key),
        None => config,
    })
}
