use std::path::PathBuf;

use clap::Parser;
use devduck_core::LogLevel;

/// DevDuck: a developer assistant that routes each message to the right persona.
#[derive(Parser, Debug)]
#[command(name = "devduck", version, about)]
pub struct Args {
    /// Config file path; the workspace or user config.yaml when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Session id; history is kept per session and tool.
    #[arg(long, default_value = "terminal")]
    pub session: String,

    /// Log filter: a level (debug, info, ...) or a full RUST_LOG style directive.
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}

/// Filter for the tracing subscriber
///
/// A bare level applies to the assistant's own targets; anything else is
/// passed through as an `EnvFilter` directive.
pub fn filter_directive(log_level: Option<&str>) -> Option<String> {
    let raw = log_level?;
    Some(match raw.parse::<LogLevel>() {
        Ok(level) => format!("devduck={0},devduck_cli={0}", level.as_filter()),
        Err(_) => raw.to_string(),
    })
}
