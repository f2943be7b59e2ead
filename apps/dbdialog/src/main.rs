//! # dbdialog - Schema-to-API Dialog Compiler
//!
//! The main binary for dbdialog.
//!
//! Reads a schema snapshot, generates one dialog document per schema object
//! and keeps those documents in line as queries are added, copied, removed,
//! or partially updated.
//!
//! ## Usage
//!
//! ```bash
//! dbdialog init
//! dbdialog create Products
//! dbdialog update Products PriceUpdate --columns Price --history
//! dbdialog sync
//! dbdialog show Products -Q ReadList
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = dbdialog::cli::Cli::parse();

    // DBDIALOG_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("DBDIALOG_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "dbdialog=debug,dbdialog_core=debug"
    } else {
        "dbdialog=info,dbdialog_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = dbdialog::cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the dbdialog startup banner.
fn print_banner() {
    eprintln!(
        "dbdialog v{} - schema-to-API dialog compiler\n",
        env!("CARGO_PKG_VERSION")
    );
}
