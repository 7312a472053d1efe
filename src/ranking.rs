//! Ranking view: participant × stage heatmap and rank lines
//!
//! The heatmap has one row per participant, ordered by total points at the
//! last stage, and one column per stage. Every cell carries the participant's
//! rank, stage points and running total so the page can switch the colored
//! metric without reshaping the grid.
//!
//! A metric switch produces a single [`ColorFrame`] holding fills, labels and
//! the legend for that metric. The page applies a frame as a whole, so cells,
//! labels and legend never disagree about which metric is shown.

use crate::color;
use crate::data::RankRecord;
use crate::error::{Error, Result};
use crate::format;
use crate::scale::{extent, ticks};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Widest viewport (px) still considered narrow
pub const NARROW_MAX_WIDTH: f64 = 600.0;

/// On narrow viewports only stages `> last - NARROW_STAGE_WINDOW` are shown
pub const NARROW_STAGE_WINDOW: u32 = 5;

const LEGEND_TICKS: usize = 5;
const LEGEND_STOPS: usize = 10;

/// The value a heatmap cell is colored by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Rank,
    Points,
    TotalPoints,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Rank, Metric::Points, Metric::TotalPoints];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Rank => "rank",
            Metric::Points => "points",
            Metric::TotalPoints => "total_points",
        }
    }

    /// Heading used on the legend
    pub fn title(&self) -> &'static str {
        match self {
            Metric::Rank => "Rank",
            Metric::Points => "Stage points",
            Metric::TotalPoints => "Total points",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rank" => Ok(Metric::Rank),
            "points" => Ok(Metric::Points),
            "total_points" | "total-points" | "total" => Ok(Metric::TotalPoints),
            _ => Err(Error::UnknownMetric(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viewport {
    #[default]
    Wide,
    Narrow,
}

impl Viewport {
    pub fn from_width(width: f64) -> Self {
        if width > NARROW_MAX_WIDTH {
            Viewport::Wide
        } else {
            Viewport::Narrow
        }
    }

    /// Whether `stage` is displayed when `last` is the current stage
    pub fn shows(&self, stage: u32, last: u32) -> bool {
        match self {
            Viewport::Wide => true,
            Viewport::Narrow => last < NARROW_STAGE_WINDOW || stage > last - NARROW_STAGE_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub participant: String,
    pub stage: u32,
    pub rank: u32,
    pub points: f64,
    pub total_points: f64,
}

impl HeatmapCell {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Rank => self.rank as f64,
            Metric::Points => self.points,
            Metric::TotalPoints => self.total_points,
        }
    }

    pub fn label(&self, metric: Metric) -> String {
        match metric {
            Metric::Rank => self.rank.to_string(),
            Metric::Points | Metric::TotalPoints => format::integer(self.value(metric)),
        }
    }
}

/// Sequential color domain. `start` maps to the dark end of the ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorDomain {
    pub start: f64,
    pub end: f64,
}

impl ColorDomain {
    /// Rank runs from worst to best so that rank 1 gets the bright end.
    /// Points run from 0 to the maximum.
    pub fn for_metric(metric: Metric, cells: &[HeatmapCell]) -> Self {
        let range = extent(cells.iter().map(|c| c.value(metric)));
        match metric {
            Metric::Rank => {
                let (lo, hi) = range.unwrap_or((0.0, 0.0));
                Self { start: hi, end: lo }
            }
            Metric::Points | Metric::TotalPoints => {
                let hi = range.map(|(_, hi)| hi).unwrap_or(0.0);
                Self { start: 0.0, end: hi }
            }
        }
    }

    /// Position of `value` along the ramp, 0.5 for a zero-width domain
    pub fn normalize(&self, value: f64) -> f64 {
        if self.end == self.start {
            0.5
        } else {
            (value - self.start) / (self.end - self.start)
        }
    }

    pub fn color(&self, value: f64) -> String {
        color::viridis(self.normalize(value))
    }
}

/// Participants ordered by total points at the last stage, highest first
///
/// Ties keep the order in which the participants appear in `records`.
/// Participants without a row at the last stage follow, in encounter order.
pub fn participant_order(records: &[RankRecord]) -> Vec<String> {
    let last = records.iter().map(|r| r.stage).max().unwrap_or(0);

    let mut finals: Vec<&RankRecord> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for r in records.iter().filter(|r| r.stage == last) {
        if seen.insert(r.participant.as_str()) {
            finals.push(r);
        }
    }
    finals.sort_by(|a, b| b.total_points.total_cmp(&a.total_points));

    let mut order: Vec<String> = finals.iter().map(|r| r.participant.clone()).collect();
    for r in records {
        if seen.insert(r.participant.as_str()) {
            order.push(r.participant.clone());
        }
    }
    order
}

/// Participant × stage grid
#[derive(Debug, Clone, Serialize)]
pub struct Heatmap {
    pub current_stage: u32,
    pub viewport: Viewport,
    pub stages: Vec<u32>,
    pub participants: Vec<String>,
    pub cells: Vec<HeatmapCell>,
}

impl Heatmap {
    pub fn build(records: &[RankRecord], viewport: Viewport) -> Self {
        let current_stage = records.iter().map(|r| r.stage).max().unwrap_or(0);
        let participants = participant_order(records);

        let mut seen: HashSet<(&str, u32)> = HashSet::new();
        let cells: Vec<HeatmapCell> = records
            .iter()
            .filter(|r| viewport.shows(r.stage, current_stage))
            .filter(|r| seen.insert((r.participant.as_str(), r.stage)))
            .map(|r| HeatmapCell {
                participant: r.participant.clone(),
                stage: r.stage,
                rank: r.rank,
                points: r.points,
                total_points: r.total_points,
            })
            .collect();

        let mut stages: Vec<u32> = cells.iter().map(|c| c.stage).collect();
        stages.sort_unstable();
        stages.dedup();

        tracing::debug!(
            current_stage,
            participants = participants.len(),
            stages = stages.len(),
            cells = cells.len(),
            "built heatmap"
        );

        Self {
            current_stage,
            viewport,
            stages,
            participants,
            cells,
        }
    }

    pub fn cell(&self, participant: &str, stage: u32) -> Option<&HeatmapCell> {
        self.cells
            .iter()
            .find(|c| c.participant == participant && c.stage == stage)
    }

    pub fn color_domain(&self, metric: Metric) -> ColorDomain {
        ColorDomain::for_metric(metric, &self.cells)
    }

    /// Fills, labels and legend for one metric
    pub fn color_frame(&self, metric: Metric) -> ColorFrame {
        let domain = self.color_domain(metric);

        let cells = self
            .cells
            .iter()
            .map(|c| CellPaint {
                participant: c.participant.clone(),
                stage: c.stage,
                fill: domain.color(c.value(metric)),
                label: c.label(metric),
            })
            .collect();

        let tick_values = legend_ticks(domain);
        let legend = Legend {
            title: metric.title(),
            domain,
            tick_labels: tick_values.iter().map(|&t| format::integer(t)).collect(),
            ticks: tick_values,
            stops: color::gradient_stops(LEGEND_STOPS)
                .into_iter()
                .map(|(offset, color)| GradientStop { offset, color })
                .collect(),
        };

        ColorFrame {
            metric,
            cells,
            legend,
        }
    }
}

/// Legend ticks on whole numbers only, since every label is an integer
fn legend_ticks(domain: ColorDomain) -> Vec<f64> {
    let all = ticks(domain.start, domain.end, LEGEND_TICKS);
    let whole: Vec<f64> = all.iter().copied().filter(|t| t.fract() == 0.0).collect();
    if whole.is_empty() {
        all
    } else {
        whole
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellPaint {
    pub participant: String,
    pub stage: u32,
    pub fill: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: &'static str,
    pub domain: ColorDomain,
    pub ticks: Vec<f64>,
    pub tick_labels: Vec<String>,
    pub stops: Vec<GradientStop>,
}

/// Everything that changes when the colored metric changes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorFrame {
    pub metric: Metric,
    pub cells: Vec<CellPaint>,
    pub legend: Legend,
}

/// Heatmap component: owns the grid and the currently applied frame
#[derive(Debug, Clone)]
pub struct HeatmapView {
    heatmap: Heatmap,
    frame: ColorFrame,
}

impl HeatmapView {
    pub fn new(heatmap: Heatmap) -> Self {
        let frame = heatmap.color_frame(Metric::default());
        Self { heatmap, frame }
    }

    pub fn heatmap(&self) -> &Heatmap {
        &self.heatmap
    }

    pub fn metric(&self) -> Metric {
        self.frame.metric
    }

    pub fn frame(&self) -> &ColorFrame {
        &self.frame
    }

    /// Switch the colored metric. The new frame replaces the old one whole.
    pub fn update_color_mode(&mut self, metric: Metric) -> &ColorFrame {
        if self.frame.metric != metric {
            self.frame = self.heatmap.color_frame(metric);
        }
        &self.frame
    }
}

// ============================================================================
// Rank lines
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankPoint {
    pub stage: u32,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankSeries {
    pub participant: String,
    pub points: Vec<RankPoint>,
}

/// Name and total printed at the end of each line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndLabel {
    pub participant: String,
    pub stage: u32,
    pub rank: u32,
    pub points_label: String,
}

/// Bump chart of rank over stages
#[derive(Debug, Clone, Serialize)]
pub struct RankLines {
    pub x_domain: (u32, u32),
    pub y_domain: (u32, u32),
    pub series: Vec<RankSeries>,
    pub labels: Vec<EndLabel>,
}

impl RankLines {
    pub fn build(records: &[RankRecord], viewport: Viewport) -> Self {
        let last = records.iter().map(|r| r.stage).max().unwrap_or(0);
        let shown: Vec<&RankRecord> = records
            .iter()
            .filter(|r| viewport.shows(r.stage, last))
            .collect();

        let first = shown.iter().map(|r| r.stage).min().unwrap_or(last);
        let min_rank = shown.iter().map(|r| r.rank).min().unwrap_or(0);
        let max_rank = shown.iter().map(|r| r.rank).max().unwrap_or(0);

        let mut series: Vec<RankSeries> = Vec::new();
        for r in &shown {
            let point = RankPoint {
                stage: r.stage,
                rank: r.rank,
            };
            match series.iter_mut().find(|s| s.participant == r.participant) {
                Some(s) => s.points.push(point),
                None => series.push(RankSeries {
                    participant: r.participant.clone(),
                    points: vec![point],
                }),
            }
        }
        for s in &mut series {
            s.points.sort_by_key(|p| p.stage);
        }

        let labels = shown
            .iter()
            .filter(|r| r.stage == last)
            .map(|r| EndLabel {
                participant: r.participant.clone(),
                stage: r.stage,
                rank: r.rank,
                points_label: format::points(r.total_points),
            })
            .collect();

        Self {
            x_domain: (first, last),
            y_domain: (min_rank, max_rank),
            series,
            labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn rec(stage: u32, participant: &str, rank: u32, points: f64, total: f64) -> RankRecord {
        RankRecord {
            stage,
            participant: participant.to_string(),
            rank,
            points,
            total_points: total,
        }
    }

    fn scenario() -> Vec<RankRecord> {
        vec![
            rec(1, "A", 1, 100.0, 100.0),
            rec(1, "B", 2, 80.0, 80.0),
            rec(2, "A", 2, 50.0, 150.0),
            rec(2, "B", 1, 80.0, 160.0),
        ]
    }

    fn long_race(stages: u32) -> Vec<RankRecord> {
        let mut out = Vec::new();
        for s in 1..=stages {
            out.push(rec(s, "A", 1, 10.0, 10.0 * s as f64));
            out.push(rec(s, "B", 2, 5.0, 5.0 * s as f64));
        }
        out
    }

    // ==========================================================================
    // ORDERING TESTS
    // ==========================================================================

    #[test]
    fn test_scenario_order_and_current_stage() {
        let heatmap = Heatmap::build(&scenario(), Viewport::Wide);
        assert_eq!(heatmap.participants, vec!["B".to_string(), "A".to_string()]);
        assert_eq!(heatmap.current_stage, 2);
    }

    #[test]
    fn test_order_is_a_real_sort() {
        // Input order A, B, C; final totals make the order C, A, B
        let records = vec![
            rec(1, "A", 2, 0.0, 20.0),
            rec(1, "B", 3, 0.0, 10.0),
            rec(1, "C", 1, 0.0, 30.0),
        ];
        let order = participant_order(&records);
        assert_eq!(order, vec!["C", "A", "B"]);

        let mut reversed: Vec<&RankRecord> = records.iter().collect();
        reversed.sort_by(|a, b| a.total_points.total_cmp(&b.total_points));
        let reversed: Vec<&str> = reversed.iter().map(|r| r.participant.as_str()).collect();
        assert_ne!(order, reversed);
    }

    #[test]
    fn test_order_ties_keep_encounter_order() {
        let records = vec![
            rec(1, "X", 1, 0.0, 50.0),
            rec(1, "Y", 2, 0.0, 50.0),
            rec(1, "Z", 3, 0.0, 60.0),
        ];
        assert_eq!(participant_order(&records), vec!["Z", "X", "Y"]);
    }

    #[test]
    fn test_participant_missing_last_stage_goes_last() {
        let records = vec![
            rec(1, "Quit", 1, 0.0, 99.0),
            rec(1, "A", 2, 0.0, 10.0),
            rec(2, "A", 1, 0.0, 20.0),
        ];
        assert_eq!(participant_order(&records), vec!["A", "Quit"]);
    }

    #[test]
    fn test_ranks_per_stage_are_permutation() {
        let heatmap = Heatmap::build(&long_race(6), Viewport::Wide);
        let mut by_stage: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for c in &heatmap.cells {
            by_stage.entry(c.stage).or_default().push(c.rank);
        }
        for (_, mut ranks) in by_stage {
            ranks.sort_unstable();
            let expected: Vec<u32> = (1..=ranks.len() as u32).collect();
            assert_eq!(ranks, expected);
        }
    }

    // ==========================================================================
    // GRID TESTS
    // ==========================================================================

    #[test]
    fn test_narrow_viewport_keeps_recent_stages() {
        let heatmap = Heatmap::build(&long_race(12), Viewport::Narrow);
        assert_eq!(heatmap.stages, vec![8, 9, 10, 11, 12]);
        assert_eq!(heatmap.current_stage, 12);

        let wide = Heatmap::build(&long_race(12), Viewport::Wide);
        assert_eq!(wide.stages.len(), 12);
    }

    #[test]
    fn test_narrow_viewport_short_race() {
        let heatmap = Heatmap::build(&long_race(3), Viewport::Narrow);
        assert_eq!(heatmap.stages, vec![1, 2, 3]);
    }

    #[test]
    fn test_narrow_viewport_at_max_stage() {
        let records = vec![rec(u32::MAX, "A", 1, 1.0, 1.0), rec(1, "A", 1, 1.0, 1.0)];
        let heatmap = Heatmap::build(&records, Viewport::Narrow);
        assert_eq!(heatmap.stages, vec![u32::MAX]);
        assert!(Viewport::Narrow.shows(u32::MAX - 4, u32::MAX));
        assert!(!Viewport::Narrow.shows(u32::MAX - 5, u32::MAX));
        assert!(Viewport::Narrow.shows(0, 4));
    }

    #[test]
    fn test_viewport_from_width() {
        assert_eq!(Viewport::from_width(601.0), Viewport::Wide);
        assert_eq!(Viewport::from_width(600.0), Viewport::Narrow);
        assert_eq!(Viewport::from_width(320.0), Viewport::Narrow);
    }

    #[test]
    fn test_missing_cell_is_absent() {
        let records = vec![
            rec(1, "A", 1, 5.0, 5.0),
            rec(2, "A", 1, 5.0, 10.0),
            rec(2, "B", 2, 1.0, 1.0),
        ];
        let heatmap = Heatmap::build(&records, Viewport::Wide);
        assert!(heatmap.cell("B", 1).is_none());
        assert_eq!(heatmap.cell("B", 2).map(|c| c.rank), Some(2));
        assert_eq!(heatmap.cells.len(), 3);
    }

    #[test]
    fn test_empty_records() {
        let heatmap = Heatmap::build(&[], Viewport::Wide);
        assert_eq!(heatmap.current_stage, 0);
        assert!(heatmap.cells.is_empty());
        assert!(heatmap.participants.is_empty());

        let frame = heatmap.color_frame(Metric::TotalPoints);
        assert!(frame.cells.is_empty());
        assert_eq!(frame.legend.ticks, vec![0.0]);
    }

    // ==========================================================================
    // COLOR MODE TESTS
    // ==========================================================================

    #[test]
    fn test_rank_legend_has_one_label_per_rank() {
        let records = vec![
            rec(1, "A", 1, 0.0, 30.0),
            rec(1, "B", 2, 0.0, 20.0),
            rec(1, "C", 3, 0.0, 10.0),
        ];
        let legend = Heatmap::build(&records, Viewport::Wide)
            .color_frame(Metric::Rank)
            .legend;
        assert_eq!(legend.ticks, vec![3.0, 2.0, 1.0]);
        assert_eq!(legend.tick_labels, vec!["3", "2", "1"]);
    }

    #[test]
    fn test_small_points_legend_skips_fractions() {
        let records = vec![rec(1, "A", 1, 3.0, 3.0), rec(1, "B", 2, 1.0, 1.0)];
        let legend = Heatmap::build(&records, Viewport::Wide)
            .color_frame(Metric::Points)
            .legend;
        assert!(legend.ticks.iter().all(|t| t.fract() == 0.0));
        assert_eq!(legend.tick_labels, vec!["0", "1", "2", "3"]);
    }

    #[test]
    fn test_rank_domain_is_reversed() {
        let heatmap = Heatmap::build(&long_race(2), Viewport::Wide);
        let domain = heatmap.color_domain(Metric::Rank);
        assert_eq!(domain, ColorDomain { start: 2.0, end: 1.0 });
        assert_eq!(domain.normalize(1.0), 1.0);
        assert_eq!(domain.color(1.0), color::viridis(1.0));
    }

    #[test]
    fn test_points_domain_starts_at_zero() {
        let heatmap = Heatmap::build(&scenario(), Viewport::Wide);
        assert_eq!(
            heatmap.color_domain(Metric::TotalPoints),
            ColorDomain { start: 0.0, end: 160.0 }
        );
        assert_eq!(
            heatmap.color_domain(Metric::Points),
            ColorDomain { start: 0.0, end: 100.0 }
        );
    }

    #[test]
    fn test_single_value_domain_is_renderable() {
        let heatmap = Heatmap::build(&[rec(1, "A", 1, 0.0, 0.0)], Viewport::Wide);
        let domain = heatmap.color_domain(Metric::Points);
        assert_eq!(domain.normalize(0.0), 0.5);
        assert_eq!(heatmap.color_frame(Metric::Points).legend.ticks, vec![0.0]);
    }

    #[test]
    fn test_switch_updates_fill_label_and_legend_together() {
        let mut view = HeatmapView::new(Heatmap::build(&scenario(), Viewport::Wide));
        assert_eq!(view.metric(), Metric::Rank);
        assert_eq!(view.frame().legend.title, "Rank");

        let frame = view.update_color_mode(Metric::TotalPoints).clone();
        assert_eq!(frame.metric, Metric::TotalPoints);
        assert_eq!(frame.legend.title, "Total points");
        assert_eq!(frame.legend.domain, ColorDomain { start: 0.0, end: 160.0 });

        let b2 = frame
            .cells
            .iter()
            .find(|c| c.participant == "B" && c.stage == 2)
            .unwrap();
        assert_eq!(b2.label, "160");
        assert_eq!(b2.fill, color::viridis(1.0));
        assert_eq!(view.metric(), Metric::TotalPoints);
    }

    #[test]
    fn test_label_formatting() {
        let cell = HeatmapCell {
            participant: "A".into(),
            stage: 1,
            rank: 3,
            points: 12.4,
            total_points: 1520.6,
        };
        assert_eq!(cell.label(Metric::Rank), "3");
        assert_eq!(cell.label(Metric::Points), "12");
        assert_eq!(cell.label(Metric::TotalPoints), "1.521");
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("rank".parse::<Metric>().unwrap(), Metric::Rank);
        assert_eq!("TOTAL_POINTS".parse::<Metric>().unwrap(), Metric::TotalPoints);
        assert!("speed".parse::<Metric>().is_err());
        assert_eq!(serde_json::to_string(&Metric::TotalPoints).unwrap(), "\"total_points\"");
    }

    // ==========================================================================
    // RANK LINE TESTS
    // ==========================================================================

    #[test]
    fn test_rank_lines() {
        let lines = RankLines::build(&scenario(), Viewport::Wide);
        assert_eq!(lines.x_domain, (1, 2));
        assert_eq!(lines.y_domain, (1, 2));
        assert_eq!(lines.series.len(), 2);
        assert_eq!(lines.series[0].participant, "A");
        assert_eq!(
            lines.series[0].points,
            vec![RankPoint { stage: 1, rank: 1 }, RankPoint { stage: 2, rank: 2 }]
        );
        assert_eq!(lines.labels.len(), 2);
        assert_eq!(lines.labels[1].points_label, "160 pts");
    }

    #[test]
    fn test_rank_lines_empty() {
        let lines = RankLines::build(&[], Viewport::Narrow);
        assert_eq!(lines.x_domain, (0, 0));
        assert!(lines.series.is_empty());
    }
}
