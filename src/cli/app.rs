// ABOUTME: Main application orchestration for the replacement CLI
// ABOUTME: Coordinates CLI arguments, configuration, logging and template rendering

use anyhow::{bail, Result};
use clap::CommandFactory;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::commands;
use super::{Args, Config};
use crate::engine::ReplacementEngine;
use crate::functions::{FunctionRegistry, ShellHost, YamlModuleLoader};

pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Initialize logging on stderr so rendered output on stdout stays clean
    pub fn init_logging(&self, no_color: bool) -> Result<()> {
        let log_level = self.config.logging.level.as_str();

        let env_filter = EnvFilter::try_from_env("REPLACEMENT_LOG")
            .unwrap_or_else(|_| EnvFilter::new(log_level));

        let result = match self.config.logging.format.as_str() {
            "compact" => tracing_subscriber::fmt()
                .compact()
                .with_env_filter(env_filter)
                .with_ansi(!no_color)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init(),
            _ => tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_ansi(!no_color)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init(),
        };

        // A subscriber may already be installed when embedded
        if let Err(e) = result {
            debug!("Logging already initialized: {}", e);
        }

        debug!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    /// Run the application with parsed arguments
    pub fn run(&self, args: Args) -> Result<ExitCode> {
        self.init_logging(args.no_color)?;

        info!("Starting replacement v{}", crate::VERSION);
        debug!("Configuration loaded from: {:?}", args.config);

        if args.verbose {
            bail!("verbose not implemented");
        }

        let Some(template) = args.template else {
            eprintln!("need a template; use '-t YAML_PATH'.");
            eprintln!("{}", Args::command().render_help());
            return Ok(ExitCode::from(1));
        };

        let pairs = Args::parse_meta(&args.meta);
        let meta = self.config.seed_meta(&pairs);
        let engine = self.engine(args.allow_host);

        commands::render_template(&engine, &template, meta)?;
        Ok(ExitCode::SUCCESS)
    }

    /// Engine with module file loading, plus the shell host when allowed
    pub fn engine(&self, allow_host: bool) -> ReplacementEngine {
        let mut functions = FunctionRegistry::new();
        functions.set_loader(Box::new(YamlModuleLoader));

        let engine = ReplacementEngine::new().with_functions(functions);

        if allow_host || self.config.allow_host {
            info!("Host evaluation enabled using '{}'", self.config.shell);
            engine.with_host(ShellHost::new().with_shell(&self.config.shell))
        } else {
            engine
        }
    }

    /// Create application from command line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = Config::load(args.config.clone())?;
        Ok(Self::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_engine_host_switch() {
        let app = App::new(Config::default());
        assert!(!app.engine(false).host_enabled());
        assert!(app.engine(true).host_enabled());

        let config = Config {
            allow_host: true,
            ..Config::default()
        };
        assert!(App::new(config).engine(false).host_enabled());
    }

    #[test]
    fn test_verbose_fails() {
        let args = Args::try_parse_from(["replacement", "-v", "-t", "x.yaml"]).unwrap();
        let error = App::new(Config::default()).run(args).unwrap_err();
        assert_eq!(error.to_string(), "verbose not implemented");
    }

    #[test]
    fn test_missing_template_exit_code() {
        let args = Args::try_parse_from(["replacement"]).unwrap();
        let code = App::new(Config::default()).run(args).unwrap();
        assert_eq!(code, ExitCode::from(1));
    }
}
