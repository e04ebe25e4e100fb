use clap::Parser;

use swiss_pharma_scrape::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    swiss_pharma_scrape::run(Cli::parse()).await
}
