use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod domain;
mod error;
mod infrastructure;
mod observability;
mod services;
mod ui;

use cli::{Cli, Commands};
use commands::{plan, render, run};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .init();

    let result = match cli.command {
        Commands::Run {
            push,
            docker_host,
            token,
            timeout,
        } => {
            run::execute(
                &cli.matrix,
                &cli.output_dir,
                run::RunOptions {
                    push,
                    docker_host,
                    token,
                    timeout,
                },
            )
            .await
        }
        Commands::Render => render::execute(&cli.matrix, &cli.output_dir),
        Commands::Plan => plan::execute(&cli.matrix, &cli.output_dir),
    };

    if let Err(e) = result {
        tracing::error!(error = %format!("{:#}", e), "langmatrix failed");
        ui::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
