//! OSA sync CLI - DHIS2 extracts to blob storage
//!
//! # Commands
//!
//! ```bash
//! osa-sync sync                     # Facility master data → CSV → azcopy
//! osa-sync sync --paged             # Same, using paged org units
//! osa-sync transfer                 # Stock report for LAST_MONTH → CSV → azcopy
//! osa-sync transfer 202403          # Stock report for an explicit period
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! osa-sync dimensions               # Show the dx lists built from mapping.json
//! ```

use clap::{Parser, Subcommand};
use osa::logs::{log_error, log_success};
use osa::{
    run_sync, run_transfer, Config, Period, PipelineError, ProductCatalog, RunSummary, SyncOptions,
    TransferOptions,
};

#[derive(Parser)]
#[command(name = "osa-sync")]
#[command(about = "Extract DHIS2 facility and stock data to OSA CSV files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync facility master data
    Sync {
        /// Page through org units even if a facility SQL view is configured
        #[arg(long)]
        paged: bool,

        /// Write the CSV without uploading it
        #[arg(long)]
        skip_transfer: bool,
    },

    /// Extract, reshape and upload the stock report
    Transfer {
        /// Period token (e.g. 202403, LAST_MONTH)
        #[arg(default_value = Period::LAST_MONTH)]
        period: Period,

        /// Write the CSV without uploading it
        #[arg(long)]
        skip_transfer: bool,
    },

    /// Show the dimension lists built from the product mapping
    Dimensions,
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync { paged, skip_transfer } => {
            eprintln!("🏥 Facility sync");
            run_sync(
                &config,
                SyncOptions {
                    force_paged: paged,
                    skip_transfer,
                },
            )
            .await
            .map(report_summary)
        }

        Commands::Transfer { period, skip_transfer } => {
            eprintln!("📦 Stock report for {}", period);
            run_transfer(
                &config,
                TransferOptions {
                    period,
                    skip_transfer,
                    extraction_date: None,
                },
            )
            .await
            .map(report_summary)
        }

        Commands::Dimensions => cmd_dimensions(&config),
    };

    if let Err(e) = result {
        log_error(format!("Run failed ({}): {}", e.kind(), e));
        std::process::exit(1);
    }
}

fn report_summary(summary: RunSummary) {
    log_success(format!(
        "{} lines in {}",
        summary.record_count,
        summary.output_path.display()
    ));
    if let Some(output) = summary.transfer_output.filter(|o| !o.trim().is_empty()) {
        println!("{}", output.trim_end());
    }
    eprintln!("\n✨ Done!");
}

fn cmd_dimensions(config: &Config) -> Result<(), PipelineError> {
    let catalog = ProductCatalog::load(&config.mapping_path)?;
    let lists = catalog.dimension_lists();
    println!("stock on hand: dx:{}", lists.stock_on_hand_dx());
    println!("quantity used: dx:{}", lists.quantity_used_dx());
    Ok(())
}
