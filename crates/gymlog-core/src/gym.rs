//! Gym configuration record.
//!
//! One configured gym per installation: location, quota payment date and the
//! workout routine rotation. Stored as a singleton row by the storage layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Point;

/// The configured gym and its rotation state.
///
/// `routine_names` is a native ordered sequence in the API; how it is
/// encoded on disk is a storage concern. `current_routine_index` is only
/// meaningful when `routine_names` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GymConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Attendance counting is windowed to samples at or after this instant.
    pub last_payment_date: Option<DateTime<Utc>>,
    /// Rotation schedule, possibly empty.
    pub routine_names: Vec<String>,
    /// Pointer into `routine_names`, wraps modulo its length.
    pub current_routine_index: usize,
    /// Last calendar day for which the rotation was advanced.
    pub last_routine_advance_date: Option<NaiveDate>,
}

impl GymConfig {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            last_payment_date: None,
            routine_names: Vec::new(),
            current_routine_index: 0,
            last_routine_advance_date: None,
        }
    }

    pub fn location(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }

    /// Name of the routine the pointer currently rests on, if any are
    /// configured. Tolerates an index left over from a longer list.
    pub fn current_routine(&self) -> Option<&str> {
        if self.routine_names.is_empty() {
            return None;
        }
        let idx = self.current_routine_index % self.routine_names.len();
        self.routine_names.get(idx).map(String::as_str)
    }
}
