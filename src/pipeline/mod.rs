//! Dashboard assembly: source → metrics → annotations → display surface.
//!
//! ## Run order
//!
//! 1. Connect to the configured data source and load the price history.
//! 2. Derive market cap, revenue and EPS over the whole table.
//! 3. Format the latest-value annotation for each metric chart.
//! 4. Send every block to the surface and `finish()` it.
//!
//! Steps 1–3 complete before the surface sees its first block, so a failure
//! anywhere leaves no partial dashboard.

use crate::annotation::{self, FormatMode};
use crate::config::{AppConfig, DashboardConfig};
use crate::error::{AtStage, DashboardError, Stage, StageError};
use crate::metrics;
use crate::models::{Column, DerivedRecord, PriceRecord, Row};
use crate::render::{ChartSpec, DisplaySurface, TableView};
use crate::source::connect;
use crate::utils::fmt_count;
use chrono::NaiveDate;
use tracing::info;

// ── Metric charts ─────────────────────────────────────────────────────────────

struct MetricChart {
    column: Column,
    mode: FormatMode,
    name: &'static str,
    y_label: &'static str,
    currency_ticks: bool,
}

const METRIC_CHARTS: [MetricChart; 3] = [
    MetricChart {
        column: Column::MarketCap,
        mode: FormatMode::Billions,
        name: "Market Cap",
        y_label: "Market Cap (in billions)",
        currency_ticks: true,
    },
    MetricChart {
        column: Column::Revenue,
        mode: FormatMode::Billions,
        name: "Revenue",
        y_label: "Revenue (in billions)",
        currency_ticks: true,
    },
    MetricChart {
        column: Column::Earnings,
        mode: FormatMode::Eps,
        name: "Earnings",
        y_label: "Earnings per Share (EPS in USD)",
        currency_ticks: false,
    },
];

const FIELD_DESCRIPTIONS: [(&str, &str); 7] = [
    ("date", "date"),
    ("open", "The price at market open."),
    ("high", "The highest price for that day."),
    ("low", "The lowest price for that day."),
    ("close", "The price at market close, adjusted for splits."),
    (
        "adj_close",
        "The closing price after adjustments for all applicable splits and dividend distributions. \
         Data is adjusted using appropriate split and dividend multipliers, adhering to \
         Center for Research in Security Prices (CRSP) standards.",
    ),
    ("volume", "The number of shares traded on that day."),
];

fn default_section_text(column: Column) -> String {
    match column {
        Column::MarketCap => "## Market Cap\nThe market capitalization, commonly called market cap, is the total \
             market value of a publicly traded company's outstanding shares and is commonly used \
             to measure how much a company is worth."
            .to_string(),
        Column::Revenue => "## Revenue\nThe revenue is the total amount of income that a company generates by the \
             sale of goods or services. Unlike with the earnings no expenses are subtracted. \
             Here it is approximated as daily traded volume times closing price."
            .to_string(),
        Column::Earnings => "## Earnings\nEarnings per share, approximated as the revenue proxy divided by the \
             number of outstanding shares."
            .to_string(),
        other => format!("## {}", other),
    }
}

fn section_text(dash: &DashboardConfig, column: Column) -> String {
    let custom = match column {
        Column::MarketCap => dash.market_cap_text.as_ref(),
        Column::Revenue => dash.revenue_text.as_ref(),
        Column::Earnings => dash.earnings_text.as_ref(),
        _ => None,
    };
    custom
        .cloned()
        .unwrap_or_else(|| default_section_text(column))
}

// ── Report ────────────────────────────────────────────────────────────────────

pub struct Section {
    pub text: String,
    pub chart: ChartSpec,
}

/// Everything the surface will receive, computed up front.
pub struct Report {
    pub intro: String,
    pub fields: TableView,
    pub preview: TableView,
    pub sections: Vec<Section>,
    pub derived: Vec<DerivedRecord>,
    pub stats: DashboardStats,
}

#[derive(Debug)]
pub struct DashboardStats {
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub latest_close: Option<f64>,
    /// (metric, annotation label)
    pub labels: Vec<(String, String)>,
}

pub fn fields_table(company: &str) -> TableView {
    TableView {
        title: Some(format!("{} Stock Data Fields", company)),
        headers: vec!["Variable".into(), "Description".into()],
        rows: FIELD_DESCRIPTIONS
            .iter()
            .map(|(var, desc)| vec![var.to_string(), desc.to_string()])
            .collect(),
    }
}

/// The last `n` rows of the raw price history, oldest first.
pub fn preview_table(company: &str, records: &[PriceRecord], n: usize) -> TableView {
    let start = records.len().saturating_sub(n);
    TableView {
        title: Some(format!("{} Stock Data (Latest {} rows)", company, n)),
        headers: FIELD_DESCRIPTIONS.iter().map(|(var, _)| var.to_string()).collect(),
        rows: records[start..]
            .iter()
            .map(|r| {
                vec![
                    r.date.format("%Y-%m-%d").to_string(),
                    r.open.to_string(),
                    r.high.to_string(),
                    r.low.to_string(),
                    r.close.to_string(),
                    r.adj_close.to_string(),
                    fmt_count(r.volume),
                ]
            })
            .collect(),
    }
}

fn metric_chart(
    company: &str,
    derived: &[DerivedRecord],
    metric: &MetricChart,
) -> Result<ChartSpec, StageError> {
    let annotation = annotation::format(derived, metric.column, metric.mode).at_stage(Stage::Format)?;
    let y = derived
        .iter()
        .map(|r| {
            r.value(metric.column).ok_or_else(|| {
                DashboardError::Schema(format!("column {} is not present on {}", metric.column, r.date()))
            })
        })
        .collect::<Result<Vec<f64>, DashboardError>>()
        .at_stage(Stage::Format)?;

    Ok(ChartSpec {
        title: format!("{} History of {}", metric.name, company),
        series_name: metric.column.name().to_string(),
        x_label: "Year".to_string(),
        y_label: metric.y_label.to_string(),
        x: derived
            .iter()
            .map(|r| r.price.date.format("%Y-%m-%d").to_string())
            .collect(),
        y,
        y_tick_prefix: metric.currency_ticks.then(|| "$".to_string()),
        y_tick_format: metric.currency_ticks.then(|| ".2s".to_string()),
        hover_mode: "x unified".to_string(),
        template: "plotly_white".to_string(),
        annotation,
    })
}

// ── Dashboard ─────────────────────────────────────────────────────────────────

pub struct Dashboard {
    config: AppConfig,
}

impl Dashboard {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Derive and annotate an already-loaded price history.
    pub fn build(&self, records: Vec<PriceRecord>) -> Result<Report, StageError> {
        let dash = &self.config.dashboard;

        info!("=== Step 2: Deriving metrics ({} rows) ===", records.len());
        let derived = metrics::derive(&records, self.config.metrics.outstanding_shares)
            .at_stage(Stage::Derive)?;

        info!("=== Step 3: Formatting annotations ===");
        let mut sections = Vec::with_capacity(METRIC_CHARTS.len());
        for metric in &METRIC_CHARTS {
            let chart = metric_chart(&dash.company, &derived, metric)?;
            info!("{}: latest {}", metric.name, chart.annotation.label);
            sections.push(Section {
                text: section_text(dash, metric.column),
                chart,
            });
        }

        let mut intro = format!("# {}\n", dash.title());
        if let Some(body) = &dash.intro {
            intro.push_str(body);
        }

        let stats = DashboardStats {
            rows: records.len(),
            first_date: records.first().map(|r| r.date),
            last_date: records.last().map(|r| r.date),
            latest_close: records.last().map(|r| r.close),
            labels: sections
                .iter()
                .map(|s| (s.chart.series_name.clone(), s.chart.annotation.label.clone()))
                .collect(),
        };

        Ok(Report {
            intro,
            fields: fields_table(&dash.company),
            preview: preview_table(&dash.company, &records, dash.preview_rows),
            sections,
            derived,
            stats,
        })
    }

    /// Connect, load, derive and annotate without rendering.
    pub async fn prepare(&self) -> Result<Report, StageError> {
        info!("=== Step 1: Loading {} ===", self.config.data.source);
        let source = connect(&self.config.data).at_stage(Stage::Connect)?;
        let records = source.fetch_prices().await.at_stage(Stage::Load)?;
        self.build(records)
    }

    pub async fn render(
        report: &Report,
        surface: &mut dyn DisplaySurface,
    ) -> Result<(), StageError> {
        info!("=== Step 4: Rendering {} sections ===", report.sections.len());
        let res: anyhow::Result<()> = async {
            surface.text(&report.intro).await?;
            surface.table(&report.fields).await?;
            surface.table(&report.preview).await?;
            for section in &report.sections {
                surface.text(&section.text).await?;
                surface.chart(&section.chart).await?;
            }
            surface.finish().await
        }
        .await;
        res.at_stage(Stage::Render)
    }

    pub async fn run(&self, surface: &mut dyn DisplaySurface) -> Result<DashboardStats, StageError> {
        let report = self.prepare().await?;
        Self::render(&report, surface).await?;

        let stats = report.stats;
        info!(
            "=== Done: {} rows | {:?} → {:?} ===",
            stats.rows, stats.first_date, stats.last_date
        );
        Ok(stats)
    }
}
