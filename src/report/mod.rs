//! Report generation for a loaded pool
//!
//! Output formatters for the shaped chart data:
//!
//! - **HTML**: Self-contained page drawing the heatmap, rank lines and
//!   contribution charts with D3.js from embedded JSON
//! - **JSON**: The same payload, for programmatic consumption
//!
//! # Usage
//!
//! ```ignore
//! use tourpool::report::{self, Report, ReportOptions};
//!
//! let report = Report::build(&dataset, &ReportOptions::default());
//! report::generate("pool.html", &report)?;  // HTML
//! report::generate("pool.json", &report)?;  // JSON
//! ```

pub mod html;
pub mod json;

use crate::analysis::{weekly_summary, ContributionChart, HoverReport, StackMode, WeekTotal};
use crate::app::App;
use crate::data::{integrity, Dataset};
use crate::error::Result;
use crate::ranking::{ColorFrame, Heatmap, Metric, RankLines, Viewport};
use serde::Serialize;
use std::path::Path;

/// Generate a report in the format matching the file extension
pub fn generate<P: AsRef<Path>>(path: P, report: &Report) -> Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;

    match ext.as_str() {
        "json" => json::write(&mut file, report),
        _ => html::write(&mut file, report),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Participants initially shown on the analysis tab. Empty shows the leader.
    pub selected: Vec<String>,
    /// Always draw the narrow ranking layout, whatever the page width
    pub narrow: bool,
}

/// One line of the standings at the current stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub rank: u32,
    pub participant: String,
    pub total_points: f64,
    pub best_week: Option<WeekTotal>,
    pub worst_week: Option<WeekTotal>,
}

/// Standings at the last stage, best first
pub fn standings(dataset: &Dataset) -> Vec<Standing> {
    let last = dataset.last_stage();
    let mut rows: Vec<Standing> = dataset
        .ranking
        .iter()
        .filter(|r| r.stage == last)
        .map(|r| {
            let weekly = weekly_summary(&dataset.analysis, &r.participant);
            Standing {
                rank: r.rank,
                participant: r.participant.clone(),
                total_points: r.total_points,
                best_week: weekly.best,
                worst_week: weekly.worst,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.total_points.total_cmp(&a.total_points));
    rows
}

/// Heatmap plus a precomputed frame per metric
#[derive(Debug, Clone, Serialize)]
pub struct RankingPayload {
    pub heatmap: Heatmap,
    pub frames: Vec<ColorFrame>,
    pub rank_lines: RankLines,
}

impl RankingPayload {
    fn build(dataset: &Dataset, viewport: Viewport) -> Self {
        let mut app = App::new(dataset.clone()).with_viewport(viewport);
        let view = app.ranking_view();
        let frames = Metric::ALL
            .iter()
            .map(|&m| view.update_color_mode(m).clone())
            .collect();
        let heatmap = view.heatmap().clone();

        Self {
            heatmap,
            frames,
            rank_lines: app.rank_lines(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantCharts {
    pub participant: String,
    pub none: ContributionChart,
    pub expand: ContributionChart,
    pub hover: Vec<HoverReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisPayload {
    pub stages: Vec<u32>,
    pub participants: Vec<ParticipantCharts>,
    pub selected: Vec<String>,
}

impl AnalysisPayload {
    fn build(dataset: &Dataset, options: &ReportOptions) -> Self {
        let mut app = App::new(dataset.clone());
        app.navigate("#analyse");

        if !options.selected.is_empty() {
            let selection = app.selection_mut();
            selection.deselect_all();
            for p in &options.selected {
                selection.set(p, true);
            }
        }

        let view = app.analysis_view();
        let order = view.participants().to_vec();
        let participants = order
            .iter()
            .map(|p| {
                let none = view.chart(p, StackMode::None);
                let expand = view.chart(p, StackMode::Expand);
                ParticipantCharts {
                    participant: p.clone(),
                    hover: none.hover_table(),
                    none,
                    expand,
                }
            })
            .collect();
        let stages = view.stages().to_vec();

        Self {
            stages,
            participants,
            selected: app.selection().display_order(&order),
        }
    }
}

/// Everything the page needs, already shaped
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated: String,
    pub current_stage: u32,
    pub standings: Vec<Standing>,
    pub wide: RankingPayload,
    pub narrow: RankingPayload,
    pub analysis: AnalysisPayload,
    pub issues: Vec<String>,
    pub narrow_only: bool,
}

impl Report {
    pub fn build(dataset: &Dataset, options: &ReportOptions) -> Self {
        let issues = integrity::check(dataset)
            .iter()
            .map(|i| i.to_string())
            .collect();

        Self {
            generated: chrono::Local::now().to_rfc3339(),
            current_stage: dataset.last_stage(),
            standings: standings(dataset),
            wide: RankingPayload::build(dataset, Viewport::Wide),
            narrow: RankingPayload::build(dataset, Viewport::Narrow),
            analysis: AnalysisPayload::build(dataset, options),
            issues,
            narrow_only: options.narrow,
        }
    }

    pub fn leader(&self) -> Option<&Standing> {
        self.standings.first()
    }
}
