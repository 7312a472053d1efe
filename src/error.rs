//! Error type shared by the loader and the report writers

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{table} table is missing column `{column}`")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("failed to write report: {0}")]
    Write(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unknown metric `{0}` (expected rank, points or total_points)")]
    UnknownMetric(String),

    #[error("unknown stack mode `{0}` (expected none or expand)")]
    UnknownStackMode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
