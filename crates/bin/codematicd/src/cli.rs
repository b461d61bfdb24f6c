//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Rule-driven automation daemon: reads input codes from stdin and runs the
/// first matching rule, alongside file-change and schedule triggers.
#[derive(Debug, Parser)]
#[command(name = "codematicd", version, about)]
pub struct Cli {
    /// Configuration file (`.toml` or `.json`). Defaults to
    /// `codematic.toml` in the working directory when it exists.
    #[arg(short, long, env = "CODEMATIC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seed a variable before the startup rules run. Repeatable.
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Run the input rules for a single code and exit, without starting
    /// watchers or schedules.
    #[arg(long, value_name = "CODE")]
    pub once: Option<String>,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("empty variable name in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
