mod bulk;
mod cli;
mod store;
mod suggest;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("longtail=info".parse()?),
        )
        .init();

    cli::run(Cli::parse()).await
}
