use crate::cli::output::Output;
use crate::config::GistwatchConfig;
use crate::context::AppContext;
use anyhow::{Context, Result};
use clap::Args;

#[derive(Args, Default)]
pub struct WatchArgs {
    /// Also serve the read view while watching
    #[arg(long)]
    pub serve: bool,
}

pub async fn execute(args: WatchArgs, config: GistwatchConfig, output: &Output) -> Result<()> {
    let ctx = AppContext::open(config)?;
    let watcher = ctx.watcher()?;

    output.info(&format!(
        "Watching public gists every {}s, findings go to {}",
        ctx.config.scan.interval_secs,
        ctx.store.path().display()
    ));

    let (stop_tx, mut stop_rx) = tokio::sync::watch::channel(false);
    let server = if args.serve {
        let addr = ctx.server_addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind read view to {addr}"))?;
        output.info(&format!("Read view on http://{addr}/home"));

        let server = ctx.read_server();
        Some(tokio::spawn(async move {
            server
                .serve_on(listener, async move {
                    let _ = stop_rx.changed().await;
                })
                .await
        }))
    } else {
        None
    };

    let cycles = watcher.run_until(super::shutdown_signal()).await;
    let _ = stop_tx.send(true);

    if let Some(handle) = server {
        handle.await.context("Read view task failed")??;
    }

    output.success(&format!("Stopped after {cycles} scan cycles"));
    Ok(())
}
