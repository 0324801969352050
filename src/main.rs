mod annotation;
mod config;
mod error;
mod loader;
mod metrics;
mod models;
mod pipeline;
mod render;
mod source;
mod utils;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::annotation::FormatMode;
use crate::config::{AppConfig, OutputFormat};
use crate::models::Column;
use crate::pipeline::{fields_table, Dashboard};
use crate::render::{DisplaySurface, HtmlDashboard, JsonDashboard};

#[derive(Parser)]
#[command(name = "stock-dashboard", about = "Stock price metrics dashboard", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args)]
struct SourceArgs {
    /// CSV path or http(s) URL (overrides data.source)
    #[arg(short, long, env = "DASH_SOURCE")]
    source: Option<String>,

    /// Outstanding share count (overrides metrics.outstanding_shares)
    #[arg(long)]
    shares: Option<f64>,
}

impl SourceArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(source) = self.source {
            config.data.source = source;
        }
        if let Some(shares) = self.shares {
            config.metrics.outstanding_shares = shares;
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build the dashboard and write it to disk
    Render {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file (overrides output.path)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output format (overrides output.format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Load and derive, then print the latest values
    Inspect {
        #[command(flatten)]
        source: SourceArgs,

        /// Also annotate this column (e.g. close, market_cap, earnings)
        #[arg(long, requires = "mode")]
        column: Option<Column>,

        /// Label style for --column: billions | eps
        #[arg(long, requires = "column")]
        mode: Option<FormatMode>,
    },

    /// Print the input field descriptions
    Fields,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "stock_dashboard=info,warn",
        1 => "stock_dashboard=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load()?;

    match cli.command {
        Command::Render { source, out, format } => {
            let _t = utils::Timer::start("Dashboard render");
            source.apply(&mut config);
            if let Some(out) = out {
                config.output.path = out;
            }
            if let Some(format) = format {
                config.output.format = format;
            }

            let title = config.dashboard.title();
            let path = config.output.path.clone();
            let mut surface: Box<dyn DisplaySurface> = match config.output.format {
                OutputFormat::Html => Box::new(HtmlDashboard::new(path, title)),
                OutputFormat::Json => Box::new(JsonDashboard::new(path, title)),
            };

            let stats = Dashboard::new(config).run(surface.as_mut()).await?;
            for (metric, label) in &stats.labels {
                info!("{}: {}", metric, label.replace('\n', " "));
            }
        }

        Command::Inspect { source, column, mode } => {
            let _t = utils::Timer::start("Inspect");
            source.apply(&mut config);
            let shares = config.metrics.outstanding_shares;
            let report = Dashboard::new(config).prepare().await?;
            let stats = &report.stats;

            println!("─────────────────────────────────");
            println!("  Stock Dashboard — Data Summary");
            println!("─────────────────────────────────");
            println!("  Rows     : {}", utils::fmt_count(stats.rows as u64));
            println!("  From     : {}", stats.first_date.map(|d| d.to_string()).unwrap_or("—".into()));
            println!("  To       : {}", stats.last_date.map(|d| d.to_string()).unwrap_or("—".into()));
            println!("  Close    : {}", stats.latest_close.map(|c| format!("{:.2}", c)).unwrap_or("—".into()));
            println!("  Shares   : {}", utils::fmt_decimal(shares, 0));
            for (metric, label) in &stats.labels {
                println!("  {:<9}: {}", metric, label);
            }
            if let (Some(column), Some(mode)) = (column, mode) {
                let a = annotation::format(&report.derived, column, mode)?;
                println!("  {:<9}: {} ({})", column, a.label, a.anchor_date);
            }
            println!("─────────────────────────────────");
        }

        Command::Fields => {
            let table = fields_table(&config.dashboard.company);
            if let Some(title) = &table.title {
                println!("{}", title);
            }
            for row in &table.rows {
                println!("  {:<10} {}", row[0], row[1]);
            }
        }
    }

    Ok(())
}
