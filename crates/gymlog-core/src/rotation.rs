//! Routine rotation controller.
//!
//! The rotation pointer moves at most once per detected attendance day. The
//! decision is pure; the caller persists the returned advance. Because the
//! check compares the newest attendance day against persisted state, a
//! racing double tick converges: whichever tick persists first makes every
//! later invocation for the same day a no-op.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::gym::GymConfig;

/// A rotation advance to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationAdvance {
    pub new_index: usize,
    /// The attendance day the advance is credited to.
    pub advance_date: NaiveDate,
}

/// Decide whether the rotation pointer should advance.
///
/// Advances iff there is a newest attendance day strictly after the last
/// recorded advance (or no advance was ever recorded) and the routine list
/// is non-empty. With an empty routine list this returns `None` even when a
/// qualifying day exists, so the advance date is not consumed before any
/// routines are configured.
pub fn maybe_advance(
    attendance_days: &BTreeSet<NaiveDate>,
    config: &GymConfig,
) -> Option<RotationAdvance> {
    let latest_day = *attendance_days.iter().next_back()?;

    if let Some(last) = config.last_routine_advance_date {
        if latest_day <= last {
            return None;
        }
    }

    if config.routine_names.is_empty() {
        return None;
    }

    Some(RotationAdvance {
        new_index: (config.current_routine_index + 1) % config.routine_names.len(),
        advance_date: latest_day,
    })
}
