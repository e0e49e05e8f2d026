use crate::cli::output::Output;
use crate::config::GistwatchConfig;
use crate::context::AppContext;
use crate::query::{PageParams, View};
use anyhow::Result;
use clap::Args;

#[derive(Args, Default)]
pub struct FindingsArgs {
    /// Highest id of the page (as in the read view's `start`)
    #[arg(long, allow_hyphen_values = true)]
    pub start: Option<String>,

    /// Lowest id of the page (as in the read view's `end`)
    #[arg(long, allow_hyphen_values = true)]
    pub end: Option<String>,

    /// Print the page as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: FindingsArgs, config: GistwatchConfig, output: &Output) -> Result<()> {
    let ctx = AppContext::open(config)?;
    let params = PageParams {
        start: args.start,
        end: args.end,
    };
    let page = ctx.query_service().page(&params).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if params.start.is_some() && page.view == View::Latest {
        output.warning("Requested range is invalid, showing the latest findings");
    }

    if page.rows.is_empty() {
        match page.view {
            View::Latest => output.info("No findings recorded yet"),
            View::Range { start, end } => output.info(&format!("No findings with ids from {end} to {start}")),
        }
        return Ok(());
    }

    output.header(&format!("{} findings", page.rows.len()));
    for row in &page.rows {
        output.finding(row.internal_id, &row.html_url, &row.file, &row.line_nums);
    }
    output.blank_line();

    if let Some(next) = page.next {
        output.info(&format!(
            "More: gistwatch findings --start {} --end {}",
            next.start, next.end
        ));
    }
    Ok(())
}
