//! Application state: the loaded dataset, the two tabs and their controls
//!
//! [`App`] is the single owner of everything a session needs. Views are built
//! the first time their tab is opened and kept for the rest of the session.

use crate::analysis::{AnalysisView, ContributionChart, HoverReport, StackMode};
use crate::data::Dataset;
use crate::ranking::{ColorFrame, Heatmap, HeatmapView, Metric, RankLines, Viewport};
use crate::selection::ParticipantSelection;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Ranking,
    Analyse,
}

impl Tab {
    /// Tab for a URL fragment such as `#analyse`. Anything unknown opens
    /// the ranking tab.
    pub fn from_fragment(fragment: &str) -> Self {
        match fragment.trim().trim_start_matches('#') {
            "analyse" => Tab::Analyse,
            _ => Tab::Ranking,
        }
    }

    pub fn fragment(&self) -> &'static str {
        match self {
            Tab::Ranking => "#ranking",
            Tab::Analyse => "#analyse",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fragment().trim_start_matches('#'))
    }
}

pub struct App {
    dataset: Dataset,
    viewport: Viewport,
    active: Tab,
    ranking: Option<HeatmapView>,
    analysis: Option<AnalysisView>,
    selection: ParticipantSelection,
    mode: StackMode,
}

impl App {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            viewport: Viewport::default(),
            active: Tab::default(),
            ranking: None,
            analysis: None,
            selection: ParticipantSelection::default(),
            mode: StackMode::default(),
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn active_tab(&self) -> Tab {
        self.active
    }

    /// Switch tabs by URL fragment, initialising the target view if needed
    pub fn navigate(&mut self, fragment: &str) -> Tab {
        self.active = Tab::from_fragment(fragment);
        match self.active {
            Tab::Ranking => {
                self.ranking_view();
            }
            Tab::Analyse => {
                self.analysis_view();
            }
        }
        tracing::debug!(tab = %self.active, "navigated");
        self.active
    }

    pub fn is_visible(&self, tab: Tab) -> bool {
        self.active == tab
    }

    pub fn is_initialized(&self, tab: Tab) -> bool {
        match tab {
            Tab::Ranking => self.ranking.is_some(),
            Tab::Analyse => self.analysis.is_some(),
        }
    }

    pub fn ranking_view(&mut self) -> &mut HeatmapView {
        let (records, viewport) = (&self.dataset.ranking, self.viewport);
        self.ranking
            .get_or_insert_with(|| HeatmapView::new(Heatmap::build(records, viewport)))
    }

    pub fn analysis_view(&mut self) -> &AnalysisView {
        let (dataset, selection) = (&self.dataset, &mut self.selection);
        self.analysis.get_or_insert_with(|| {
            let view = AnalysisView::new(dataset);
            *selection = ParticipantSelection::with_leader(view.participants());
            view
        })
    }

    pub fn rank_lines(&self) -> RankLines {
        RankLines::build(&self.dataset.ranking, self.viewport)
    }

    pub fn current_stage(&self) -> u32 {
        self.dataset.last_stage()
    }

    /// Apply a color mode to the heatmap
    pub fn set_metric(&mut self, metric: Metric) -> ColorFrame {
        self.ranking_view().update_color_mode(metric).clone()
    }

    pub fn selection(&self) -> &ParticipantSelection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut ParticipantSelection {
        self.analysis_view();
        &mut self.selection
    }

    pub fn stack_mode(&self) -> StackMode {
        self.mode
    }

    pub fn set_stack_mode(&mut self, mode: StackMode) {
        self.mode = mode;
    }

    /// Charts for the current selection and stack mode
    pub fn contribution_charts(&mut self) -> Vec<ContributionChart> {
        let mode = self.mode;
        self.analysis_view();
        match &self.analysis {
            Some(view) => view.render(&self.selection, mode),
            None => Vec::new(),
        }
    }

    pub fn hover(&mut self, participant: &str, x: f64, width: f64) -> Option<HoverReport> {
        self.analysis_view().hover(participant, x, width)
    }
}
