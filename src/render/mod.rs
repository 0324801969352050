//! Display surfaces: where the dashboard blocks end up.
//!
//! The pipeline only talks to [`DisplaySurface`]; the concrete surfaces buffer
//! every block and write a single document in [`DisplaySurface::finish`], so an
//! aborted run leaves nothing behind.

pub mod html;
pub mod json;
pub mod markdown;

use crate::models::Annotation;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

pub use self::html::HtmlDashboard;
pub use self::json::JsonDashboard;

// ── Blocks ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub title: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Area chart of one metric over time, with its latest-value annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub series_name: String,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub y_tick_prefix: Option<String>,
    pub y_tick_format: Option<String>,
    pub hover_mode: String,
    pub template: String,
    pub annotation: Annotation,
}

impl ChartSpec {
    /// Plotly.js figure (`{ data, layout }`).
    pub fn to_plotly(&self) -> Value {
        let a = &self.annotation;
        let mut yaxis = json!({ "title": { "text": self.y_label } });
        if let Some(prefix) = &self.y_tick_prefix {
            yaxis["tickprefix"] = json!(prefix);
        }
        if let Some(format) = &self.y_tick_format {
            yaxis["tickformat"] = json!(format);
        }

        let mut layout = json!({
            "title": { "text": self.title },
            "xaxis": { "title": { "text": self.x_label } },
            "yaxis": yaxis,
            "hovermode": self.hover_mode,
            "annotations": [{
                "x": a.anchor_date.format("%Y-%m-%d").to_string(),
                "y": a.anchor_value,
                "text": a.text.replace('\n', "<br>"),
                "showarrow": a.style.show_arrow,
                "arrowhead": a.style.arrow_head,
                "font": { "size": a.style.font_size, "color": a.style.font_color },
            }],
        });
        if self.template == "plotly_white" {
            layout["plot_bgcolor"] = json!("white");
            layout["paper_bgcolor"] = json!("white");
            layout["xaxis"]["gridcolor"] = json!("#EBF0F8");
            layout["yaxis"]["gridcolor"] = json!("#EBF0F8");
        }

        json!({
            "data": [{
                "type": "scatter",
                "mode": "lines",
                "fill": "tozeroy",
                "name": self.series_name,
                "x": self.x,
                "y": self.y,
            }],
            "layout": layout,
        })
    }
}

// ── Surface trait ─────────────────────────────────────────────────────────────

/// Swappable rendering target.
#[async_trait]
pub trait DisplaySurface: Send {
    async fn text(&mut self, markdown: &str) -> Result<()>;
    async fn table(&mut self, table: &TableView) -> Result<()>;
    async fn chart(&mut self, chart: &ChartSpec) -> Result<()>;

    /// Flush everything collected so far.
    async fn finish(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnnotationStyle;
    use chrono::NaiveDate;

    pub(crate) fn sample_chart() -> ChartSpec {
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        ChartSpec {
            title: "Market Cap History of JPMorgan Chase".into(),
            series_name: "market_cap".into(),
            x_label: "Year".into(),
            y_label: "Market Cap (in billions)".into(),
            x: vec!["2025-03-03".into(), "2025-03-04".into()],
            y: vec![7.0e11, 7.2872e11],
            y_tick_prefix: Some("$".into()),
            y_tick_format: Some(".2s".into()),
            hover_mode: "x unified".into(),
            template: "plotly_white".into(),
            annotation: Annotation {
                anchor_date: date,
                anchor_value: 7.2872e11,
                label: "$728.72B".into(),
                text: "$728.72B\n2025-03-04".into(),
                style: AnnotationStyle::default(),
            },
        }
    }

    #[test]
    fn test_plotly_figure_shape() {
        let fig = sample_chart().to_plotly();
        assert_eq!(fig["data"][0]["fill"], "tozeroy");
        assert_eq!(fig["data"][0]["x"][1], "2025-03-04");
        assert_eq!(fig["layout"]["yaxis"]["tickprefix"], "$");
        assert_eq!(fig["layout"]["yaxis"]["tickformat"], ".2s");
        assert_eq!(fig["layout"]["hovermode"], "x unified");

        let ann = &fig["layout"]["annotations"][0];
        assert_eq!(ann["x"], "2025-03-04");
        assert_eq!(ann["text"], "$728.72B<br>2025-03-04");
        assert_eq!(ann["showarrow"], true);
        assert_eq!(ann["arrowhead"], 2);
        assert_eq!(ann["font"]["size"], 12);
        assert_eq!(ann["font"]["color"], "black");
    }

    #[test]
    fn test_no_tick_prefix_when_unset() {
        let mut chart = sample_chart();
        chart.y_tick_prefix = None;
        chart.y_tick_format = None;
        let fig = chart.to_plotly();
        assert!(fig["layout"]["yaxis"].get("tickprefix").is_none());
        assert!(fig["layout"]["yaxis"].get("tickformat").is_none());
    }
}
