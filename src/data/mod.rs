//! Loading the two input tables
//!
//! A pool is described by two flat CSV files:
//!
//! - **ranking**: one row per (stage, participant) with the participant's
//!   rank on that stage, the points scored that stage and the running total.
//! - **analysis**: one row per (stage, participant, rider) with the rider's
//!   points that stage and the rider's running contribution to the
//!   participant's total.
//!
//! Both tables are loaded once into a [`Dataset`] and never mutated
//! afterwards. Every view derives its own sorted or filtered projection.

pub mod integrity;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

pub const RANKING_FILE: &str = "ranking.csv";
pub const ANALYSIS_FILE: &str = "analysis.csv";

const RANKING_COLUMNS: &[&str] = &["stage", "participant", "rank", "total_points"];
const ANALYSIS_COLUMNS: &[&str] = &["stage", "participant", "rider_name", "points", "total_points"];

/// One participant's standing after one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankRecord {
    pub stage: u32,
    pub participant: String,
    pub rank: u32,
    #[serde(default)]
    pub points: f64,
    pub total_points: f64,
}

/// One rider's contribution to one participant after one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub stage: u32,
    pub participant: String,
    pub rider_name: String,
    pub points: f64,
    pub total_points: f64,
}

/// Immutable snapshot of both tables
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub ranking: Vec<RankRecord>,
    pub analysis: Vec<AnalysisRecord>,
}

impl Dataset {
    pub fn new(ranking: Vec<RankRecord>, analysis: Vec<AnalysisRecord>) -> Self {
        Self { ranking, analysis }
    }

    /// Load `ranking.csv` and `analysis.csv` from a directory
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Self::load(dir.join(RANKING_FILE), dir.join(ANALYSIS_FILE))
    }

    /// Load both tables. Either one failing fails the whole load.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(ranking: P, analysis: Q) -> Result<Self> {
        let ranking = load_table::<RankRecord>(ranking.as_ref(), "ranking", RANKING_COLUMNS)?;
        let analysis =
            load_table::<AnalysisRecord>(analysis.as_ref(), "analysis", ANALYSIS_COLUMNS)?;

        tracing::debug!(
            ranking_rows = ranking.len(),
            analysis_rows = analysis.len(),
            "loaded dataset"
        );

        Ok(Self { ranking, analysis })
    }

    /// Highest stage in the ranking table, 0 when empty
    pub fn last_stage(&self) -> u32 {
        self.ranking.iter().map(|r| r.stage).max().unwrap_or(0)
    }

    /// Participants in the order they first appear in the ranking table
    pub fn participants(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for r in &self.ranking {
            if !seen.contains(&r.participant) {
                seen.push(r.participant.clone());
            }
        }
        for r in &self.analysis {
            if !seen.contains(&r.participant) {
                seen.push(r.participant.clone());
            }
        }
        seen
    }
}

fn load_table<T: serde::de::DeserializeOwned>(
    path: &Path,
    table: &'static str,
    required: &[&'static str],
) -> Result<Vec<T>> {
    let file = std::fs::File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_table(file, path, table, required)
}

/// Parse one table from any reader, checking required columns first
pub(crate) fn read_table<T: serde::de::DeserializeOwned, R: Read>(
    reader: R,
    path: &Path,
    table: &'static str,
    required: &[&'static str],
) -> Result<Vec<T>> {
    let csv_err = |source| Error::Csv {
        path: PathBuf::from(path),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_err)?.clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(Error::MissingColumn { table, column });
        }
    }

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(csv_err)
}

/// Parse a ranking table from an in-memory string
pub fn parse_ranking(text: &str) -> Result<Vec<RankRecord>> {
    read_table(text.as_bytes(), Path::new("<ranking>"), "ranking", RANKING_COLUMNS)
}

/// Parse an analysis table from an in-memory string
pub fn parse_analysis(text: &str) -> Result<Vec<AnalysisRecord>> {
    read_table(text.as_bytes(), Path::new("<analysis>"), "analysis", ANALYSIS_COLUMNS)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // CSV LOADING TESTS
    // ==========================================================================

    #[test]
    fn test_parse_ranking_typed_columns() {
        let rows = parse_ranking(
            "stage,participant,rank,points,total_points\n\
             1,Jan,1,40,40\n\
             1,Piet,2,32.5,32.5\n",
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].stage, 1);
        assert_eq!(rows[0].participant, "Jan");
        assert_eq!(rows[1].rank, 2);
        assert!((rows[1].total_points - 32.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_ranking_points_column_optional() {
        // The oldest exports carried only the running total
        let rows = parse_ranking("stage,participant,rank,total_points\n3,Jan,1,120\n").unwrap();
        assert_eq!(rows[0].points, 0.0);
        assert_eq!(rows[0].total_points, 120.0);
    }

    #[test]
    fn test_parse_ranking_ignores_extra_columns_and_whitespace() {
        let rows =
            parse_ranking("stage, participant ,rank,total_points,team\n 2 , Kees ,1, 10 ,x\n")
                .unwrap();
        assert_eq!(rows[0].participant, "Kees");
        assert_eq!(rows[0].stage, 2);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let err = parse_analysis("stage,participant,points,total_points\n1,Jan,3,3\n").unwrap_err();
        match err {
            Error::MissingColumn { table, column } => {
                assert_eq!(table, "analysis");
                assert_eq!(column, "rider_name");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_row_fails_whole_table() {
        let err = parse_ranking("stage,participant,rank,total_points\none,Jan,1,10\n").unwrap_err();
        assert!(matches!(err, Error::Csv { .. }));
    }

    #[test]
    fn test_empty_table_is_fine() {
        let rows = parse_analysis("stage,participant,rider_name,points,total_points\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Dataset::load_dir("/definitely/not/here").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    // ==========================================================================
    // DATASET HELPERS
    // ==========================================================================

    #[test]
    fn test_last_stage_and_participants() {
        let ranking = parse_ranking(
            "stage,participant,rank,total_points\n1,B,1,5\n1,A,2,3\n2,A,1,9\n2,B,2,8\n",
        )
        .unwrap();
        let ds = Dataset::new(ranking, vec![]);

        assert_eq!(ds.last_stage(), 2);
        assert_eq!(ds.participants(), vec!["B".to_string(), "A".to_string()]);
        assert_eq!(Dataset::default().last_stage(), 0);
    }
}
