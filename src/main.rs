use anyhow::Result;
use replacement::cli::{App, Args};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let args = Args::parse_args();
    let app = App::from_args(&args)?;

    app.run(args)
}
