use clap::Parser;
use eyre::Result as EyreResult;
use meshtest_harness::cli::{setup, RootCommand};

#[tokio::main]
async fn main() -> EyreResult<()> {
    setup()?;

    let command = RootCommand::parse();

    command.run().await
}
