// ABOUTME: Opt-in host capability for expression evaluation and code execution blocks
// ABOUTME: Provides the Host trait and a shell-backed implementation

use anyhow::{bail, Context};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Evaluates `eval` and `exec` block inputs.
///
/// This is the one place a template can run arbitrary code; the engine only
/// dispatches to a host the embedding application injected.
pub trait Host: Send + Sync {
    /// Evaluate an expression to a value
    fn eval(&self, expr: &str, meta: &Mapping, base_dir: &Path) -> anyhow::Result<Value>;

    /// Execute code and return the text it produced
    fn exec(&self, code: &str, meta: &Mapping, base_dir: &Path) -> anyhow::Result<String>;

    fn host_type(&self) -> &'static str;
}

/// Runs block input through a shell.
///
/// The shell runs in the template's directory with every string, number and
/// boolean meta entry exported as an environment variable.
#[derive(Debug, Clone)]
pub struct ShellHost {
    pub shell: String,
    pub env: HashMap<String, String>,
}

impl Default for ShellHost {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            env: HashMap::new(),
        }
    }
}

impl ShellHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shell(mut self, shell: &str) -> Self {
        self.shell = shell.to_string();
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    fn run(&self, code: &str, meta: &Mapping, base_dir: &Path) -> anyhow::Result<String> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(code);
        self.configure_command(&mut cmd, meta, base_dir);

        debug!("Running '{}' with {} in {}", code, self.shell, base_dir.display());

        let output = cmd
            .output()
            .with_context(|| format!("Failed to start shell '{}'", self.shell))?;
        Self::handle_output(output)
    }

    /// Configure environment, working directory and stdio
    fn configure_command(&self, cmd: &mut Command, meta: &Mapping, base_dir: &Path) {
        for (key, value) in meta {
            let (Some(key), Some(value)) = (key.as_str(), env_value(value)) else {
                continue;
            };
            if is_env_name(key) {
                cmd.env(key, value);
            }
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if !base_dir.as_os_str().is_empty() {
            cmd.current_dir(base_dir);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
    }

    fn handle_output(output: Output) -> anyhow::Result<String> {
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            bail!("exited with code {}: {}", exit_code, stderr.trim_end());
        }

        Ok(stdout)
    }
}

impl Host for ShellHost {
    /// Run the expression and parse what it printed as YAML.
    fn eval(&self, expr: &str, meta: &Mapping, base_dir: &Path) -> anyhow::Result<Value> {
        let stdout = self.run(expr, meta, base_dir)?;
        Ok(serde_yaml::from_str(&stdout)
            .unwrap_or_else(|_| Value::String(stdout.trim_end().to_string())))
    }

    fn exec(&self, code: &str, meta: &Mapping, base_dir: &Path) -> anyhow::Result<String> {
        self.run(code, meta, base_dir)
    }

    fn host_type(&self) -> &'static str {
        "shell"
    }
}

fn env_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_env_name(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
