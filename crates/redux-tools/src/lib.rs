//! Shared plumbing for the command-line tools.

use flexi_logger::{Logger, LoggerHandle};
use redux_instruments::template::Value;

/// Start logging to stderr. `RUST_LOG` wins over `default_spec`.
///
/// Keep the returned handle alive for the lifetime of the program.
pub fn init_logging(default_spec: &str) -> Option<LoggerHandle> {
    Logger::try_with_env_or_str(default_spec)
        .or_else(|_| Logger::try_with_str("info"))
        .and_then(|logger| logger.log_to_stderr().start())
        .map_err(|e| eprintln!("Logger initialization failed: {e}"))
        .ok()
}

/// Parse `KEY=VALUE` or `SECTION.KEY=VALUE` into a namelist override.
pub fn parse_override(arg: &str) -> Result<(String, Value), String> {
    let (path, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("Expected KEY=VALUE, got '{}'", arg))?;
    let path = path.trim();
    let value = value.trim();
    if path.is_empty() {
        return Err(format!("Empty key in '{}'", arg));
    }
    match path.split_once('.') {
        Some((section, key)) if !section.is_empty() && !key.is_empty() => {
            Ok((section.to_string(), Value::section([(key, value)])))
        }
        Some(_) => Err(format!("Malformed SECTION.KEY in '{}'", arg)),
        None => Ok((path.to_string(), Value::scalar(value))),
    }
}

/// Group overrides so that several keys of one section merge into a single
/// section override.
pub fn collect_overrides(args: &[String]) -> Result<Vec<(String, Value)>, String> {
    let mut out: Vec<(String, Value)> = Vec::new();
    for arg in args {
        let (key, value) = parse_override(arg)?;
        match (out.iter_mut().find(|(k, _)| *k == key), value) {
            (Some((_, Value::Section(existing))), Value::Section(new)) => existing.extend(new),
            (Some((_, slot)), value) => *slot = value,
            (None, value) => out.push((key, value)),
        }
    }
    Ok(out)
}
