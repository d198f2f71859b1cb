//! Web Reader Server
//!
//! HTTP gateway returning synthesized speech with word timepoints.

use anyhow::Result;
use clap::Parser;
use web_reader_common::tracing::init_tracing;
use web_reader_common::{Config, HttpServerBuilder, ListenArgs};
use web_reader_server::{AppState, create_router};

#[derive(Parser, Debug)]
#[command(name = "web-reader-server")]
#[command(about = "Speech gateway with word timepoints for karaoke-style highlighting")]
struct Args {
    #[command(flatten)]
    listen: ListenArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    // Loads .env, so HOST/PORT from the file are visible to clap below.
    let mut config = Config::from_env()?;
    let args = Args::parse();
    args.listen.apply(&mut config);

    let bind_addr = config.bind_addr();
    tracing::info!(addr = %bind_addr, "web-reader-server starting...");

    let router = create_router(AppState::new(config));
    HttpServerBuilder::new(router)
        .with_bind_addr(bind_addr)
        .run()
        .await?;

    tracing::info!("web-reader-server stopped");
    Ok(())
}
