//! Recorded macro types
//!
//! A [`Macro`] is an immutable, time-ordered list of [`MacroAction`]s.

use macromaker_core::{Error, InputEvent, Result};
use serde::{Deserialize, Serialize};

/// One recorded event with its offset from the start of recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroAction {
    /// Milliseconds since recording start
    pub t: u64,
    #[serde(flatten)]
    pub event: InputEvent,
}

impl MacroAction {
    pub fn new(t: u64, event: InputEvent) -> Self {
        Self { t, event }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Macro {
    actions: Vec<MacroAction>,
}

impl Macro {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fails if timestamps ever decrease.
    pub fn from_actions(actions: Vec<MacroAction>) -> Result<Self> {
        if let Some(w) = actions.windows(2).find(|w| w[1].t < w[0].t) {
            return Err(Error::invalid_state(format!(
                "action at {}ms follows action at {}ms",
                w[1].t, w[0].t
            )));
        }
        Ok(Self { actions })
    }

    /// Caller guarantees non-decreasing timestamps.
    pub(crate) fn from_sorted(actions: Vec<MacroAction>) -> Self {
        debug_assert!(actions.windows(2).all(|w| w[0].t <= w[1].t));
        Self { actions }
    }

    pub fn actions(&self) -> &[MacroAction] {
        &self.actions
    }

    /// Timestamp of the last action, 0 when empty
    pub fn duration_ms(&self) -> u64 {
        self.actions.last().map_or(0, |a| a.t)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
