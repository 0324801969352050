use super::{ChartSpec, DisplaySurface, TableView};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

/// Writes the dashboard as a JSON array of typed blocks.
pub struct JsonDashboard {
    path: PathBuf,
    title: String,
    blocks: Vec<Value>,
}

impl JsonDashboard {
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn document(&self) -> Value {
        json!({ "title": self.title, "blocks": self.blocks })
    }
}

#[async_trait]
impl DisplaySurface for JsonDashboard {
    async fn text(&mut self, markdown: &str) -> Result<()> {
        self.blocks.push(json!({ "kind": "text", "markdown": markdown }));
        Ok(())
    }

    async fn table(&mut self, table: &TableView) -> Result<()> {
        self.blocks.push(json!({ "kind": "table", "table": table }));
        Ok(())
    }

    async fn chart(&mut self, chart: &ChartSpec) -> Result<()> {
        self.blocks.push(json!({
            "kind": "chart",
            "label": chart.annotation.label,
            "figure": chart.to_plotly(),
        }));
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Could not create dir {:?}", parent))?;
        }
        let body = serde_json::to_vec_pretty(&self.document())?;
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("Failed to write {:?}", self.path))?;
        info!("Wrote {} blocks to {:?}", self.blocks.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::sample_chart;

    #[test]
    fn test_blocks_in_order() {
        let mut out = JsonDashboard::new("unused.json", "JPM");
        tokio_test::block_on(async {
            out.text("# JPM").await.unwrap();
            out.chart(&sample_chart()).await.unwrap();
        });

        let doc = out.document();
        assert_eq!(doc["title"], "JPM");
        assert_eq!(doc["blocks"][0]["kind"], "text");
        assert_eq!(doc["blocks"][1]["kind"], "chart");
        assert_eq!(doc["blocks"][1]["label"], "$728.72B");
        assert_eq!(doc["blocks"][1]["figure"]["layout"]["hovermode"], "x unified");
    }
}
