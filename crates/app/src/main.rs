// CLI modules
mod cli;
mod logging;
mod state;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Init, Inspect, Pull, Push};
use tokio::sync::watch;

command_enum! {
    (Init, Init),
    (Push, Push),
    (Pull, Pull),
    (Inspect, Inspect),
}

/// Flip the returned watch to true on the first SIGINT or SIGTERM.
///
/// An upload in flight finishes its current attempt and skips any retry.
fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    tracing::warn!(error = %e, "cannot listen for SIGTERM");
                    let _ = tokio::signal::ctrl_c().await;
                    let _ = tx.send(true);
                    return;
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::debug!("stopping retries on SIGINT"),
                _ = sigterm.recv() => tracing::debug!("stopping retries on SIGTERM"),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            tracing::debug!("stopping retries on ctrl-c");
        }
        let _ = tx.send(true);
    });

    rx
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let guards = match logging::init(args.log_level, args.log_dir.as_deref()) {
        Ok(guards) => guards,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let ctx = cli::op::OpContext::new(args.config_path, shutdown_signal());

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    // process::exit skips destructors; flush buffered log lines first.
    drop(guards);
    std::process::exit(code);
}
