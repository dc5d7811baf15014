mod args;
mod commands;
mod output;
mod prompt;

use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "portainer-deploy",
    about = "Build the current directory and deploy it as a container through Portainer"
)]
#[command(version)]
struct Cli {
    /// Settings as KEY=VALUE pairs. `config=<path>` is required;
    /// `username=<name>` skips the username prompt.
    #[arg(value_name = "KEY=VALUE", value_parser = args::parse_key_value)]
    settings: Vec<(String, String)>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let args = args::InvocationArgs::from_pairs(&cli.settings)?;
    commands::deploy(&args).await
}
