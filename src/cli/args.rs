// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the template flag, meta tokens and global switches of the replacement binary

use clap::Parser;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "replacement")]
#[command(about = "Execute a YAML template and print the resulting text")]
#[command(version)]
pub struct Args {
    #[arg(short, long, value_name = "YAML_PATH", help = "Template file to execute")]
    pub template: Option<PathBuf>,

    #[arg(short, long, help = "Verbose output (not implemented)")]
    pub verbose: bool,

    #[arg(short, long, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable 'eval' and 'exec' blocks (runs template code in a shell)")]
    pub allow_host: bool,

    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,

    #[arg(value_name = "META", help = "Initial meta values (key:value)")]
    pub meta: Vec<String>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Split `key:value` tokens on their first colon.
    ///
    /// Tokens without a colon, or with an empty key or value, are dropped.
    pub fn parse_meta(tokens: &[String]) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(tokens.len());

        for token in tokens {
            match token.split_once(':') {
                Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                    pairs.push((key.to_string(), value.to_string()));
                }
                _ => warn!("Ignoring meta token '{}', expected 'key:value'", token),
            }
        }

        pairs
    }
}
