//! Consistency checks over a loaded dataset
//!
//! None of these are enforced. Charts render whatever the files contain, the
//! checks only surface problems in the export so they can be logged.

use super::Dataset;
use crate::format;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Allowed drift between the rider sum and the participant total
const RECONCILE_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub enum Issue {
    /// Ranks at a stage are not exactly 1..=N
    RankGap { stage: u32, expected: u32, ranks: Vec<u32> },
    /// Sum of rider contributions at the final stage differs from the ranking total
    Unreconciled {
        participant: String,
        stage: u32,
        ranking_total: f64,
        rider_total: f64,
    },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::RankGap { stage, expected, ranks } => write!(
                f,
                "stage {}: ranks {:?} are not a permutation of 1..={}",
                stage, ranks, expected
            ),
            Issue::Unreconciled {
                participant,
                stage,
                ranking_total,
                rider_total,
            } => write!(
                f,
                "{} at stage {}: riders add up to {}, ranking says {}",
                participant,
                stage,
                format::decimal(*rider_total, 1),
                format::decimal(*ranking_total, 1)
            ),
        }
    }
}

/// Ranks per stage must form a permutation of 1..=N(s)
pub fn rank_issues(dataset: &Dataset) -> Vec<Issue> {
    let mut by_stage: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for r in &dataset.ranking {
        by_stage.entry(r.stage).or_default().push(r.rank);
    }

    by_stage
        .into_iter()
        .filter_map(|(stage, mut ranks)| {
            ranks.sort_unstable();
            let expected = ranks.len() as u32;
            let is_permutation = ranks.iter().zip(1..).all(|(&rank, want)| rank == want);
            (!is_permutation).then_some(Issue::RankGap {
                stage,
                expected,
                ranks,
            })
        })
        .collect()
}

/// Rider totals at the final stage should add up to the participant total
pub fn reconcile_issues(dataset: &Dataset) -> Vec<Issue> {
    let last = dataset.last_stage();

    let mut rider_totals: HashMap<&str, f64> = HashMap::new();
    for a in dataset.analysis.iter().filter(|a| a.stage == last) {
        *rider_totals.entry(a.participant.as_str()).or_default() += a.total_points;
    }

    dataset
        .ranking
        .iter()
        .filter(|r| r.stage == last)
        .filter_map(|r| {
            let rider_total = *rider_totals.get(r.participant.as_str())?;
            ((rider_total - r.total_points).abs() > RECONCILE_TOLERANCE).then(|| {
                Issue::Unreconciled {
                    participant: r.participant.clone(),
                    stage: last,
                    ranking_total: r.total_points,
                    rider_total,
                }
            })
        })
        .collect()
}

/// Run every check and log what was found
pub fn check(dataset: &Dataset) -> Vec<Issue> {
    let mut issues = rank_issues(dataset);
    issues.extend(reconcile_issues(dataset));
    for issue in &issues {
        tracing::warn!(%issue, "dataset inconsistency");
    }
    issues
}
