use anyhow::Result;
use causal_tune::cli::Cli;
use clap::Parser;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("causal_tune=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
