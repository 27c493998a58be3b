// ABOUTME: Command implementations for the replacement CLI
// ABOUTME: Renders a template file and writes the result to standard output

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::engine::{Meta, ReplacementEngine};

/// Render `template` and print the text to stdout
pub fn render_template(engine: &ReplacementEngine, template: &Path, meta: Meta) -> Result<()> {
    info!("Rendering template: {}", template.display());

    let rendered = engine
        .render(template, meta)
        .with_context(|| format!("Failed to render template '{}'", template.display()))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;

    info!("Rendered {} bytes", rendered.len());
    Ok(())
}
