use anyhow::Result;
use clap::Parser;

use posecap_lib::args::Args;

#[tokio::main]
async fn main() -> Result<()> {
    posecap_lib::run(Args::parse()).await
}
