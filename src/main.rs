mod commands;

use clap::Parser;
use managed_ticker::Shutdown;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{filter, fmt};

/// Runs a managed ticker and logs every tick it receives
#[derive(clap::Parser)]
#[clap(version = env!("CARGO_PKG_VERSION"))]
struct Opts {
    /// A level of verbosity, and can be used multiple times
    #[clap(short, long, parse(from_occurrences))]
    verbose: i32,
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Parser)]
enum Command {
    Run(commands::run::Opts),
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let opts: Opts = Opts::parse();
    let max_level = match opts.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(filter::filter_fn(move |m| {
            m.target().starts_with("managed_ticker") && m.level() <= &max_level
        }))
        .with(fmt::layer())
        .init();

    // shutdown gracefully on CTRL+C
    let shutdown = Shutdown::new();
    let shutdown_handle = shutdown.handle();
    tokio::task::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for CTRL+C");
            return;
        }
        shutdown.shutdown();
    });

    let result = match opts.command {
        Command::Run(opts) => commands::run::execute(opts, shutdown_handle).await,
    };
    if let Err(err) = result {
        tracing::error!(%err, "ticker failed");
        std::process::exit(1);
    }
}
