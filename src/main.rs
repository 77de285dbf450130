mod cli;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use booklens::config::PipelineConfig;
use booklens::context::PipelineContext;
use booklens::pipeline::batch::InvocationEvent;

use cli::{Cli, Command};

fn main() -> Result<()> {
    booklens::init_tracing();
    let cli = Cli::parse();
    let config = PipelineConfig::from_env()?;

    match cli.command {
        Command::Process { event, report } => {
            let event = read_event(&event)?;
            let ctx = PipelineContext::from_config(config)?;
            let batch = booklens::run_invocation(&ctx, event)?;

            let out = if report {
                serde_json::to_string_pretty(&batch)?
            } else {
                serde_json::to_string(&batch.response())?
            };
            println!("{out}");
        }
        Command::Status { item_id } => {
            let ctx = PipelineContext::from_config(config)?;
            let row = ctx
                .metadata
                .get(&item_id)?
                .with_context(|| format!("No metadata row for item {item_id}"))?;
            println!("{}", serde_json::to_string_pretty(&row)?);
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn read_event(path: &Path) -> Result<InvocationEvent> {
    let json = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file {}", path.display()))?
    };

    InvocationEvent::from_json(&json).context("Invalid invocation event")
}
