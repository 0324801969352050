use super::markdown::{escape_html, to_html};
use super::{ChartSpec, DisplaySurface, TableView};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = r#"
body  { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif;
        max-width: 1100px; margin: 2rem auto; padding: 0 1rem; color: #222; }
table { border-collapse: collapse; margin: 1rem 0; font-size: 0.9rem; }
th, td { border: 1px solid #ddd; padding: 4px 10px; text-align: left; vertical-align: top; }
th    { background: #f5f5f5; }
caption { font-weight: 600; text-align: left; padding: 4px 0; }
.chart { width: 100%; height: 480px; margin: 1rem 0 2rem; }
"#;

/// Single self-contained HTML page (Plotly.js loaded from CDN).
pub struct HtmlDashboard {
    path: PathBuf,
    title: String,
    body: String,
    charts: usize,
}

impl HtmlDashboard {
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            body: String::new(),
            charts: 0,
        }
    }

    pub fn render_page(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{title}</title>\n<script src=\"{cdn}\"></script>\n<style>{style}</style>\n\
             </head>\n<body>\n{body}</body>\n</html>\n",
            title = escape_html(&self.title),
            cdn = PLOTLY_CDN,
            style = STYLE,
            body = self.body,
        )
    }
}

fn table_html(table: &TableView) -> String {
    let mut html = String::from("<table>\n");
    if let Some(title) = &table.title {
        html.push_str(&format!("<caption>{}</caption>\n", escape_html(title)));
    }
    html.push_str("<thead><tr>");
    for h in &table.headers {
        html.push_str(&format!("<th>{}</th>", escape_html(h)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

#[async_trait]
impl DisplaySurface for HtmlDashboard {
    async fn text(&mut self, markdown: &str) -> Result<()> {
        self.body.push_str(&to_html(markdown));
        Ok(())
    }

    async fn table(&mut self, table: &TableView) -> Result<()> {
        self.body.push_str(&table_html(table));
        Ok(())
    }

    async fn chart(&mut self, chart: &ChartSpec) -> Result<()> {
        self.charts += 1;
        let id = format!("chart-{}", self.charts);
        // "</" must not appear inside a <script> element
        let figure = serde_json::to_string(&chart.to_plotly())
            .context("Failed to serialise chart")?
            .replace("</", "<\\/");

        self.body.push_str(&format!(
            "<div id=\"{id}\" class=\"chart\"></div>\n<script>\n\
             (function () {{ var fig = {figure}; \
             Plotly.newPlot(\"{id}\", fig.data, fig.layout, {{responsive: true}}); }})();\n\
             </script>\n",
        ));
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Could not create dir {:?}", parent))?;
        }
        tokio::fs::write(&self.path, self.render_page())
            .await
            .with_context(|| format!("Failed to write {:?}", self.path))?;
        info!("Wrote dashboard ({} charts) to {:?}", self.charts, self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::sample_chart;

    #[tokio::test]
    async fn test_page_contains_blocks() {
        let mut page = HtmlDashboard::new("unused.html", "JPM <Dashboard>");
        page.text("## Market Cap").await.unwrap();
        page.table(&TableView {
            title: Some("Fields".into()),
            headers: vec!["Variable".into(), "Description".into()],
            rows: vec![vec!["close".into(), "The price at market close.".into()]],
        })
        .await
        .unwrap();
        page.chart(&sample_chart()).await.unwrap();

        let html = page.render_page();
        assert!(html.contains("<title>JPM &lt;Dashboard&gt;</title>"));
        assert!(html.contains("<h2>Market Cap</h2>"));
        assert!(html.contains("<caption>Fields</caption>"));
        assert!(html.contains("<td>close</td>"));
        assert!(html.contains("id=\"chart-1\""));
        assert!(html.contains("$728.72B<br>2025-03-04"));
    }

    #[tokio::test]
    async fn test_nothing_written_before_finish() {
        let path = std::env::temp_dir()
            .join(format!("stock-dashboard-html-{}", std::process::id()))
            .join("out.html");
        let mut page = HtmlDashboard::new(&path, "t");
        page.text("# hello").await.unwrap();
        assert!(!path.exists());

        page.finish().await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<h1>hello</h1>"));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
