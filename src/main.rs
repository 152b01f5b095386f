use clap::Parser;
use log::info;

use storebench::api::BenchApi;
use storebench::conf::Config;
use storebench::core::{CliArgs, Command, setup_logging};
use storebench::service::BenchService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();
    let args = CliArgs::parse();
    info!(args; "storebench started");

    let config = Config::load(args.config.as_deref())?;
    let service = BenchService::new(config);

    match args.command() {
        Command::Serve => {
            let addr = service.config().server.addr();
            BenchApi::new(service).serve(&addr).await?;
        }
        Command::Run => {
            let report = service.run_all().await?;
            service.close_connections().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Repeat => {
            let results = service.run_repeated().await?;
            service.close_connections().await;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }
    Ok(())
}
