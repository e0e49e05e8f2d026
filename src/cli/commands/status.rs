use crate::cli::output::Output;
use crate::config::{GistwatchConfig, InspectorKind};
use crate::context::AppContext;
use crate::store::format_checkpoint;
use anyhow::Result;
use clap::Args;

#[derive(Args, Default)]
pub struct StatusArgs {
    /// Print the counters as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: StatusArgs, config: GistwatchConfig, output: &Output) -> Result<()> {
    let ctx = AppContext::open(config)?;
    let stats = ctx.store.call(|s| s.stats()).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    output.header("gistwatch status");
    output.key_value("Database", &ctx.store.path().display().to_string(), false);
    match stats.checkpoint {
        Some(at) => output.key_value("Last check", &format_checkpoint(at), true),
        None => output.key_value("Last check", "missing", false),
    }
    output.key_value("Gists", &stats.gists.to_string(), false);
    output.key_value("Findings", &stats.findings.to_string(), stats.findings > 0);
    if let Some(max) = stats.max_internal_id {
        output.key_value("Highest id", &max.to_string(), false);
    }

    let inspector = match ctx.config.inspector.kind {
        InspectorKind::Keywords => format!("keywords ({})", ctx.config.inspector.keywords.join(", ")),
        InspectorKind::External => format!(
            "external ({})",
            ctx.config.inspector.command.as_deref().unwrap_or_default()
        ),
    };
    output.key_value("Inspector", &inspector, false);
    output.key_value("Interval", &format!("{}s", ctx.config.scan.interval_secs), false);
    output.key_value("Page size", &ctx.config.effective_per_page().to_string(), false);
    output.key_value(
        "Credentials",
        if ctx.config.feed.token.is_some() { "configured" } else { "anonymous" },
        false,
    );

    if stats.checkpoint.is_none() {
        output.blank_line();
        output.error("The checkpoint row is missing; scan cycles will fail until it is restored");
    }
    Ok(())
}
