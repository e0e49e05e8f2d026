use crate::cli::output::Output;
use crate::config::GistwatchConfig;
use crate::context::AppContext;
use anyhow::Result;
use clap::Args;

#[derive(Args, Default)]
pub struct ServeArgs {
    /// Interface to bind (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, mut config: GistwatchConfig, output: &Output) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let ctx = AppContext::open(config)?;
    let addr = ctx.server_addr();
    output.info(&format!("Serving findings from {} on http://{addr}/home", ctx.store.path().display()));

    ctx.read_server().serve(&addr, super::shutdown_signal()).await?;
    output.success("Read view stopped");
    Ok(())
}
