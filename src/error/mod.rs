use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the loader, the metric deriver and the annotation formatter.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("domain error: {0}")]
    Domain(String),

    #[error("unknown format mode {0:?} (expected \"billions\" or \"eps\")")]
    UnknownFormatMode(String),

    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("fetch failed: {0}")]
    Fetch(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

// ── Stages ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Load,
    Derive,
    Format,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Connect => "connect",
            Stage::Load => "load",
            Stage::Derive => "derive",
            Stage::Format => "format",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

/// A pipeline failure tagged with the stage that produced it.
#[derive(Error, Debug)]
#[error("{stage} stage failed")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: BoxError,
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Attach a [`Stage`] to any fallible result.
pub trait AtStage<T> {
    fn at_stage(self, stage: Stage) -> std::result::Result<T, StageError>;
}

impl<T, E> AtStage<T> for std::result::Result<T, E>
where
    E: Into<BoxError>,
{
    fn at_stage(self, stage: Stage) -> std::result::Result<T, StageError> {
        self.map_err(|e| StageError {
            stage,
            source: e.into(),
        })
    }
}
