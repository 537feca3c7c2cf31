use clap::Parser;

use coopdash::adapter::inbound::cli::{self, command::Cli, output};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let _ = rustls::crypto::ring::default_provider().install_default();

    let args = Cli::parse();
    output::configure(output::OutputConfig::new(
        args.json,
        args.quiet,
        args.verbose,
    ));

    if let Err(e) = cli::run(args).await {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
