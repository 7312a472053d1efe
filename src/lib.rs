//! Tourpool - Ranking heatmaps and rider contribution charts for a stage-race pool
//!
//! A pool is a game where every participant picks a team of riders and
//! collects the points those riders score per stage. Tourpool loads the two
//! tables a pool exports and shapes them into everything a report page needs.
//!
//! # Overview
//!
//! - **Ranking**: a participant × stage heatmap, colored by rank, stage points
//!   or total points, with rows ordered by the current standings. A bump chart
//!   of ranks per stage sits below it.
//! - **Analysis**: per participant, a stacked area chart of each rider's
//!   cumulative contribution, in absolute points or as a share of the stage
//!   total, with hover details and a best/worst week summary.
//!
//! # Quick Start
//!
//! ```no_run
//! use tourpool::{report, Dataset, Report, ReportOptions};
//!
//! let dataset = Dataset::load_dir("./data")?;
//! let report = Report::build(&dataset, &ReportOptions::default());
//!
//! println!("Current stage: {}", report.current_stage);
//! report::generate("pool.html", &report)?;
//! # Ok::<(), tourpool::Error>(())
//! ```
//!
//! # Input Tables
//!
//! | File | Columns |
//! |------|---------|
//! | `ranking.csv` | stage, participant, rank, points, total_points |
//! | `analysis.csv` | stage, participant, rider_name, points, total_points |
//!
//! # Modules
//!
//! - [`data`]: CSV loading and integrity checks
//! - [`ranking`]: Heatmap builder, color domains, rank lines
//! - [`analysis`]: Stacked contribution builder, weekly summary, hover
//! - [`selection`]: Which participants the analysis tab shows
//! - [`app`]: Tab controller owning the views
//! - [`report`]: Output formatters (HTML, JSON)

pub mod analysis;
pub mod app;
pub mod color;
pub mod data;
pub mod error;
pub mod format;
pub mod ranking;
pub mod report;
pub mod scale;
pub mod selection;

pub use analysis::{AnalysisView, ContributionChart, StackMode};
pub use app::{App, Tab};
pub use data::{AnalysisRecord, Dataset, RankRecord};
pub use error::{Error, Result};
pub use ranking::{Heatmap, HeatmapView, Metric, Viewport};
pub use report::{Report, ReportOptions};
pub use selection::ParticipantSelection;

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // PUBLIC API TESTS
    // ==========================================================================
    //
    // These tests verify the public API surface is correct and documented.
    // ==========================================================================

    #[test]
    fn test_public_exports() {
        // Core types are re-exported from crate root
        let dataset = Dataset::default();
        let _app = App::new(dataset.clone());
        let _selection = ParticipantSelection::new(&dataset.participants());
        let _options = ReportOptions::default();
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Metric::default(), Metric::Rank);
        assert_eq!(StackMode::default(), StackMode::None);
        assert_eq!(Tab::default(), Tab::Ranking);
    }

    #[test]
    fn test_metric_variants() {
        // All metrics should be reachable by name
        for name in ["rank", "points", "total_points"] {
            let metric: Metric = name.parse().unwrap();
            assert_eq!(metric.as_str(), name);
        }
        assert!(matches!("speed".parse::<Metric>(), Err(Error::UnknownMetric(_))));
    }

    #[test]
    fn test_empty_report_builds() {
        let report = Report::build(&Dataset::default(), &ReportOptions::default());
        assert_eq!(report.current_stage, 0);
    }
}
