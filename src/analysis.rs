//! Analysis view: per-participant stacked rider contributions
//!
//! Each selected participant gets one stacked-area chart. A layer is one
//! rider, its height at a stage the rider's running contribution to the
//! participant's total. Layers are stacked in descending order of the
//! contribution at the final stage, so the biggest scorer sits at the bottom.
//!
//! All charts share one stage axis, built from every stage in the analysis
//! table, so panels line up when shown beneath each other.

use crate::color;
use crate::data::{AnalysisRecord, Dataset};
use crate::error::{Error, Result};
use crate::format;
use crate::ranking;
use crate::scale::LinearScale;
use crate::selection::ParticipantSelection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Riders per participant that get their own color
pub const TOP_RIDERS: usize = 6;

/// Stages per week bucket
pub const WEEK_LENGTH: u32 = 7;

/// Absolute charts round the y-axis up to a multiple of this
const ABSOLUTE_Y_STEP: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackMode {
    /// Absolute running totals
    #[default]
    None,
    /// Every stage normalised to fractions of the stage total
    Expand,
}

impl StackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackMode::None => "none",
            StackMode::Expand => "expand",
        }
    }
}

impl fmt::Display for StackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StackMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "absolute" => Ok(StackMode::None),
            "expand" | "percentage" | "percent" => Ok(StackMode::Expand),
            _ => Err(Error::UnknownStackMode(s.to_string())),
        }
    }
}

/// Sorted distinct stages across the whole analysis table
pub fn stage_axis(records: &[AnalysisRecord]) -> Vec<u32> {
    let mut stages: Vec<u32> = records.iter().map(|r| r.stage).collect();
    stages.sort_unstable();
    stages.dedup();
    stages
}

// ============================================================================
// Weekly summary
// ============================================================================

/// 1-based week bucket of a stage: stages 1-7 are week 1, 8-14 week 2, ...
pub fn week_of(stage: u32) -> u32 {
    stage.saturating_sub(1) / WEEK_LENGTH + 1
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekTotal {
    pub week: u32,
    pub first_stage: u32,
    pub last_stage: u32,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WeeklySummary {
    pub weeks: Vec<WeekTotal>,
    pub best: Option<WeekTotal>,
    pub worst: Option<WeekTotal>,
}

/// Stage points of one participant summed per week
///
/// Best and worst are the first weeks (in week order) reaching the maximum
/// and minimum sum.
pub fn weekly_summary(records: &[AnalysisRecord], participant: &str) -> WeeklySummary {
    let mut weeks: Vec<WeekTotal> = Vec::new();
    for r in records.iter().filter(|r| r.participant == participant) {
        let week = week_of(r.stage);
        match weeks.iter_mut().find(|w| w.week == week) {
            Some(w) => w.points += r.points,
            None => weeks.push(WeekTotal {
                week,
                first_stage: (week - 1).saturating_mul(WEEK_LENGTH).saturating_add(1),
                last_stage: week.saturating_mul(WEEK_LENGTH),
                points: r.points,
            }),
        }
    }
    weeks.sort_by_key(|w| w.week);

    let mut best: Option<&WeekTotal> = None;
    let mut worst: Option<&WeekTotal> = None;
    for w in &weeks {
        if best.map_or(true, |b| w.points > b.points) {
            best = Some(w);
        }
        if worst.map_or(true, |b| w.points < b.points) {
            worst = Some(w);
        }
    }

    WeeklySummary {
        best: best.cloned(),
        worst: worst.cloned(),
        weeks,
    }
}

// ============================================================================
// Top riders
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopRider {
    pub rider_name: String,
    pub total_points: f64,
}

/// The `k` best riders of a participant at the participant's last stage
///
/// A rider listed twice on that stage counts with the first row only, the
/// rows are not summed. Equal scores keep record order.
pub fn top_riders(records: &[AnalysisRecord], participant: &str, k: usize) -> Vec<TopRider> {
    let own: Vec<&AnalysisRecord> = records
        .iter()
        .filter(|r| r.participant == participant)
        .collect();
    let Some(last) = own.iter().map(|r| r.stage).max() else {
        return Vec::new();
    };

    let mut seen: HashSet<&str> = HashSet::new();
    let mut riders: Vec<TopRider> = own
        .iter()
        .filter(|r| r.stage == last)
        .filter(|r| seen.insert(r.rider_name.as_str()))
        .map(|r| TopRider {
            rider_name: r.rider_name.clone(),
            total_points: r.total_points,
        })
        .collect();

    riders.sort_by(|a, b| b.total_points.total_cmp(&a.total_points));
    riders.truncate(k);
    riders
}

// ============================================================================
// Dense contribution matrix
// ============================================================================

/// Rider × stage running contributions of one participant, zero where missing
///
/// Rows are ordered by the contribution at the participant's own last stage,
/// the same stage [`top_riders`] ranks on. For a participant who dropped out
/// early that is not the last column of the shared axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionMatrix {
    pub participant: String,
    pub stages: Vec<u32>,
    /// Riders in stack order, bottom layer first
    pub riders: Vec<String>,
    /// `values[rider][stage_index]`
    pub values: Vec<Vec<f64>>,
}

impl ContributionMatrix {
    pub fn build(records: &[AnalysisRecord], participant: &str, stages: &[u32]) -> Self {
        let mut riders: Vec<String> = Vec::new();
        let mut values: Vec<Vec<f64>> = Vec::new();
        let mut final_col: Option<usize> = None;

        for r in records.iter().filter(|r| r.participant == participant) {
            let Ok(col) = stages.binary_search(&r.stage) else {
                continue;
            };
            let row = match riders.iter().position(|name| *name == r.rider_name) {
                Some(row) => row,
                None => {
                    riders.push(r.rider_name.clone());
                    values.push(vec![0.0; stages.len()]);
                    riders.len() - 1
                }
            };
            values[row][col] += r.total_points;
            final_col = final_col.max(Some(col));
        }

        // Stable sort on the final column, largest first
        let mut order: Vec<usize> = (0..riders.len()).collect();
        if let Some(last) = final_col {
            order.sort_by(|&a, &b| values[b][last].total_cmp(&values[a][last]));
        }

        Self {
            participant: participant.to_string(),
            stages: stages.to_vec(),
            riders: order.iter().map(|&i| riders[i].clone()).collect(),
            values: order.iter().map(|&i| values[i].clone()).collect(),
        }
    }

    pub fn stage_total(&self, col: usize) -> f64 {
        self.values.iter().map(|row| row[col]).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.riders.is_empty()
    }
}

// ============================================================================
// Stacking
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackPoint {
    pub stage: u32,
    pub y0: f64,
    pub y1: f64,
    /// Unstacked running contribution
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub rider: String,
    pub label: String,
    pub color: String,
    pub top: bool,
    pub points: Vec<StackPoint>,
}

/// Stack the matrix rows on top of each other, stage by stage
///
/// In expand mode each stage is divided by its total. A stage where every
/// rider is at zero stays at zero height.
pub fn stack(matrix: &ContributionMatrix, mode: StackMode) -> Vec<Vec<StackPoint>> {
    let mut layers: Vec<Vec<StackPoint>> = matrix
        .riders
        .iter()
        .map(|_| Vec::with_capacity(matrix.stages.len()))
        .collect();

    for (col, &stage) in matrix.stages.iter().enumerate() {
        let total = matrix.stage_total(col);
        let norm = match mode {
            StackMode::None => 1.0,
            StackMode::Expand if total != 0.0 => total,
            StackMode::Expand => 0.0,
        };

        let mut acc = 0.0;
        for (row, layer) in layers.iter_mut().enumerate() {
            let value = matrix.values[row][col];
            let (y0, y1) = if norm == 0.0 {
                (0.0, 0.0)
            } else {
                (acc / norm, (acc + value) / norm)
            };
            acc += value;
            layer.push(StackPoint { stage, y0, y1, value });
        }
    }
    layers
}

/// Y-axis domain for a stacked chart
pub fn y_domain(layers: &[Vec<StackPoint>], mode: StackMode) -> (f64, f64) {
    match mode {
        StackMode::Expand => (0.0, 1.0),
        StackMode::None => {
            let top = layers
                .iter()
                .flat_map(|l| l.iter().map(|p| p.y1))
                .fold(0.0_f64, f64::max);
            (0.0, (top / ABSOLUTE_Y_STEP).ceil() * ABSOLUTE_Y_STEP)
        }
    }
}

// ============================================================================
// Hover
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverEntry {
    pub rider: String,
    pub label: String,
    pub color: String,
    pub value: f64,
    pub value_label: String,
    /// Fraction of the stage total
    pub share: f64,
    pub share_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverReport {
    pub participant: String,
    pub stage: u32,
    pub entries: Vec<HoverEntry>,
}

// ============================================================================
// Chart
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ContributionChart {
    pub participant: String,
    pub mode: StackMode,
    pub stages: Vec<u32>,
    pub y_domain: (f64, f64),
    pub layers: Vec<Layer>,
    pub top_riders: Vec<TopRider>,
    pub weekly: WeeklySummary,
}

impl ContributionChart {
    /// Chart for one participant against a shared stage axis
    ///
    /// A participant without analysis rows yields a chart with no layers.
    pub fn build(
        records: &[AnalysisRecord],
        participant: &str,
        stages: &[u32],
        mode: StackMode,
    ) -> Self {
        let matrix = ContributionMatrix::build(records, participant, stages);
        if matrix.is_empty() {
            tracing::debug!(participant, "no rider rows for participant");
        }
        let top = top_riders(records, participant, TOP_RIDERS);
        let stacked = stack(&matrix, mode);
        let y_domain = y_domain(&stacked, mode);

        let layers = matrix
            .riders
            .iter()
            .zip(stacked)
            .map(|(rider, points)| {
                let position = top.iter().position(|t| t.rider_name == *rider);
                Layer {
                    rider: rider.clone(),
                    label: format::last_name(rider),
                    color: color::rider_color(position).to_string(),
                    top: position.is_some(),
                    points,
                }
            })
            .collect();

        Self {
            participant: participant.to_string(),
            mode,
            stages: stages.to_vec(),
            y_domain,
            layers,
            top_riders: top,
            weekly: weekly_summary(records, participant),
        }
    }

    /// Nonzero contributions at `stage`, largest first
    pub fn hover_at_stage(&self, stage: u32) -> HoverReport {
        let Ok(col) = self.stages.binary_search(&stage) else {
            return HoverReport {
                participant: self.participant.clone(),
                stage,
                entries: Vec::new(),
            };
        };

        let total: f64 = self.layers.iter().map(|l| l.points[col].value).sum();
        let mut entries: Vec<HoverEntry> = self
            .layers
            .iter()
            .filter(|l| l.points[col].value != 0.0)
            .map(|l| {
                let value = l.points[col].value;
                let share = if total != 0.0 { value / total } else { 0.0 };
                HoverEntry {
                    rider: l.rider.clone(),
                    label: l.label.clone(),
                    color: l.color.clone(),
                    value,
                    value_label: format::integer(value),
                    share,
                    share_label: format::percent(share),
                }
            })
            .collect();
        entries.sort_by(|a, b| b.value.total_cmp(&a.value));

        HoverReport {
            participant: self.participant.clone(),
            stage,
            entries,
        }
    }

    /// Hover at pointer position `x` on a plot `width` pixels wide
    pub fn hover(&self, x: f64, width: f64) -> Option<HoverReport> {
        let stage = self.stage_at(x, width)?;
        Some(self.hover_at_stage(stage))
    }

    /// Nearest stage on the axis to pointer position `x`
    pub fn stage_at(&self, x: f64, width: f64) -> Option<u32> {
        let (&first, &last) = (self.stages.first()?, self.stages.last()?);
        let scale = LinearScale::new((first as f64, last as f64), (0.0, width));
        let wanted = scale.invert(x).round();

        self.stages
            .iter()
            .copied()
            .min_by(|a, b| {
                let da = (*a as f64 - wanted).abs();
                let db = (*b as f64 - wanted).abs();
                da.total_cmp(&db)
            })
    }

    /// Hover reports for every stage, for pages that look them up locally
    pub fn hover_table(&self) -> Vec<HoverReport> {
        self.stages.iter().map(|&s| self.hover_at_stage(s)).collect()
    }
}

// ============================================================================
// View component
// ============================================================================

/// Owns the analysis rows and the shared axis, renders charts on demand
#[derive(Debug, Clone)]
pub struct AnalysisView {
    records: Vec<AnalysisRecord>,
    stages: Vec<u32>,
    order: Vec<String>,
}

impl AnalysisView {
    pub fn new(dataset: &Dataset) -> Self {
        let mut order = ranking::participant_order(&dataset.ranking);
        for p in dataset.participants() {
            if !order.contains(&p) {
                order.push(p);
            }
        }

        let stages = stage_axis(&dataset.analysis);
        tracing::debug!(
            stages = stages.len(),
            participants = order.len(),
            "built analysis view"
        );

        Self {
            records: dataset.analysis.clone(),
            stages,
            order,
        }
    }

    pub fn stages(&self) -> &[u32] {
        &self.stages
    }

    /// All participants, highest final total first
    pub fn participants(&self) -> &[String] {
        &self.order
    }

    pub fn chart(&self, participant: &str, mode: StackMode) -> ContributionChart {
        ContributionChart::build(&self.records, participant, &self.stages, mode)
    }

    /// One chart per shown participant, in standings order
    pub fn render(
        &self,
        selection: &ParticipantSelection,
        mode: StackMode,
    ) -> Vec<ContributionChart> {
        selection
            .display_order(&self.order)
            .iter()
            .map(|p| self.chart(p, mode))
            .collect()
    }

    pub fn hover(&self, participant: &str, x: f64, width: f64) -> Option<HoverReport> {
        self.chart(participant, StackMode::None).hover(x, width)
    }
}
