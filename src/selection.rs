//! Which participants are shown on the analysis tab

use serde::Serialize;
use std::collections::BTreeMap;

/// Independent shown/hidden flag per participant
///
/// The order in which participants are toggled has no meaning. The display
/// order always comes from the standings passed to [`display_order`].
///
/// [`display_order`]: ParticipantSelection::display_order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParticipantSelection {
    shown: BTreeMap<String, bool>,
}

impl ParticipantSelection {
    /// Everyone known, nobody shown
    pub fn new<S: AsRef<str>>(participants: &[S]) -> Self {
        Self {
            shown: participants
                .iter()
                .map(|p| (p.as_ref().to_string(), false))
                .collect(),
        }
    }

    /// Only the first participant of `participants` shown
    pub fn with_leader<S: AsRef<str>>(participants: &[S]) -> Self {
        let mut selection = Self::new(participants);
        if let Some(leader) = participants.first() {
            selection.set(leader.as_ref(), true);
        }
        selection
    }

    pub fn is_shown(&self, participant: &str) -> bool {
        self.shown.get(participant).copied().unwrap_or(false)
    }

    pub fn set(&mut self, participant: &str, shown: bool) {
        self.shown.insert(participant.to_string(), shown);
    }

    /// Flip one participant, returns the new state
    pub fn toggle(&mut self, participant: &str) -> bool {
        let flag = self.shown.entry(participant.to_string()).or_insert(false);
        *flag = !*flag;
        *flag
    }

    pub fn select_all(&mut self) {
        self.shown.values_mut().for_each(|v| *v = true);
    }

    pub fn deselect_all(&mut self) {
        self.shown.values_mut().for_each(|v| *v = false);
    }

    pub fn shown_count(&self) -> usize {
        self.shown.values().filter(|v| **v).count()
    }

    /// Shown participants in `standings` order
    ///
    /// Shown participants missing from `standings` come last, alphabetically.
    pub fn display_order<S: AsRef<str>>(&self, standings: &[S]) -> Vec<String> {
        let mut out: Vec<String> = standings
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| self.is_shown(p))
            .map(str::to_string)
            .collect();

        for (p, &shown) in &self.shown {
            if shown && !out.contains(p) {
                out.push(p.clone());
            }
        }
        out
    }
}
