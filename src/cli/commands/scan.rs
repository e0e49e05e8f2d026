use crate::cli::output::Output;
use crate::config::GistwatchConfig;
use crate::context::AppContext;
use anyhow::Result;
use clap::Args;

#[derive(Args, Default)]
pub struct ScanArgs {
    /// Print the cycle report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ScanArgs, config: GistwatchConfig, output: &Output) -> Result<()> {
    let ctx = AppContext::open(config)?;
    let cycle = ctx.scan_cycle()?;

    let since = ctx.store.call(|s| s.get_checkpoint()).await?;
    output.verbose(&format!("Scanning gists updated since {since}"));

    let stats = cycle.run_once().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    output.header("Scan cycle report");
    output.key_value("Gists fetched", &stats.items_fetched.to_string(), false);
    output.key_value("Malformed gists", &stats.malformed_items.to_string(), false);
    output.key_value("Files seen", &stats.files_seen.to_string(), false);
    output.key_value(
        "Filtered",
        &format!("{} ({:.0}%)", stats.files_filtered, stats.filter_efficiency()),
        false,
    );
    output.key_value("Oversized", &stats.files_oversized.to_string(), false);
    output.key_value("Inspected", &stats.files_inspected.to_string(), false);
    output.key_value("Clean", &stats.files_clean().to_string(), false);
    output.key_value("Failed", &stats.files_failed.to_string(), stats.files_failed > 0);
    output.key_value("New findings", &stats.findings_recorded.to_string(), stats.findings_recorded > 0);
    output.key_value("Duplicates", &stats.duplicates_ignored.to_string(), false);
    output.key_value("Duration", &format!("{}ms", stats.duration_ms), false);
    output.blank_line();

    if !stats.checkpoint_advanced {
        output.warning("Checkpoint unchanged: the clock has not moved past the stored checkpoint");
    } else if stats.is_complete() {
        output.success("Checkpoint advanced");
    } else {
        output.warning(&format!(
            "Checkpoint advanced; {} files could not be inspected this cycle",
            stats.files_failed
        ));
    }
    Ok(())
}
