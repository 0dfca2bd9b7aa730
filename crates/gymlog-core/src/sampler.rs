//! Geofence sampler.
//!
//! A two-state machine (Idle/Tracking) fed by an external scheduler. It does
//! not own a timer -- the host invokes `record_tick()` at the configured
//! interval, exactly like the original background location task.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> Tracking   requires a configured gym + location permission
//! Tracking -> Idle   explicit stop only; failures never auto-stop
//! ```
//!
//! The tick boundary never propagates errors to the scheduler: transient
//! position, distance and persistence failures are logged and the tick is
//! retried on the next scheduled invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attendance::{align_to_hour, attendance_days};
use crate::error::{CoreError, DatabaseError, LocationError};
use crate::geo::{haversine_meters, GEOFENCE_RADIUS_METERS};
use crate::position::PositionProvider;
use crate::rotation::{maybe_advance, RotationAdvance};
use crate::storage::Database;

/// kv key holding the persisted tracking flag, so the Tracking state
/// survives a process restart.
const TRACKING_KEY: &str = "tracking_active";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerState {
    Idle,
    Tracking,
}

/// What one tick did. Returned to the caller for display; the scheduler
/// itself ignores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// Tracking is not active; nothing sampled.
    NotTracking,
    /// No gym configured; legitimate no-op, not an error.
    NoGymConfigured,
    /// A sample was appended and the rotation re-evaluated.
    Recorded {
        /// Hour-aligned sample timestamp.
        timestamp: DateTime<Utc>,
        distance_m: f64,
        is_present: bool,
        /// Present when this tick advanced the routine rotation.
        advance: Option<RotationAdvance>,
    },
    /// A transient failure aborted the tick; it was logged and will be
    /// retried on the next scheduled tick.
    Aborted,
}

/// Periodic geofence sampler.
///
/// Owns no scheduling and no position hardware; both are injected. One
/// instance per process, sharing the database handle with foreground
/// readers.
pub struct GeofenceSampler<'a, P: PositionProvider> {
    db: &'a Database,
    positions: P,
}

impl<'a, P: PositionProvider> GeofenceSampler<'a, P> {
    pub fn new(db: &'a Database, positions: P) -> Self {
        Self { db, positions }
    }

    /// Current tracker state, read from persisted storage.
    ///
    /// # Errors
    /// Returns an error if the kv read fails.
    pub fn state(&self) -> Result<TrackerState, DatabaseError> {
        let active = self.db.kv_get(TRACKING_KEY)?;
        Ok(match active.as_deref() {
            Some("true") => TrackerState::Tracking,
            _ => TrackerState::Idle,
        })
    }

    /// Transition Idle -> Tracking.
    ///
    /// Requires a configured gym and granted location permission. Starting
    /// while already tracking is a no-op (no duplicate registration).
    ///
    /// # Errors
    /// `CoreError::GymNotConfigured` when no gym is saved,
    /// `LocationError::PermissionDenied` when access is refused, or a
    /// database error.
    pub fn start_tracking(&self) -> Result<(), CoreError> {
        if self.db.gym_config()?.is_none() {
            return Err(CoreError::GymNotConfigured);
        }
        self.positions.ensure_permissions()?;

        if self.state()? == TrackerState::Tracking {
            tracing::debug!("tracking already active");
            return Ok(());
        }
        self.db.kv_set(TRACKING_KEY, "true")?;
        tracing::info!("location tracking started");
        Ok(())
    }

    /// Transition Tracking -> Idle. Explicit user action; always succeeds
    /// if the flag can be written, even when tracking was not active.
    ///
    /// # Errors
    /// Returns an error if the kv write fails.
    pub fn stop_tracking(&self) -> Result<(), DatabaseError> {
        self.db.kv_set(TRACKING_KEY, "false")?;
        tracing::info!("location tracking stopped");
        Ok(())
    }

    /// One scheduled tick. Never propagates an error past this boundary:
    /// internal failures are logged and reported as `TickOutcome::Aborted`.
    pub fn record_tick(&self, now: DateTime<Utc>) -> TickOutcome {
        match self.run_tick(now) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "tick aborted, retrying on next schedule");
                TickOutcome::Aborted
            }
        }
    }

    fn run_tick(&self, now: DateTime<Utc>) -> Result<TickOutcome, CoreError> {
        if self.state()? == TrackerState::Idle {
            tracing::debug!("tick while idle, skipping");
            return Ok(TickOutcome::NotTracking);
        }
        let Some(gym) = self.db.gym_config()? else {
            tracing::debug!("no gym configured, skipping tick");
            return Ok(TickOutcome::NoGymConfigured);
        };

        let position = self.positions.current_position()?;
        let distance_m = haversine_meters(position, gym.location());
        if !distance_m.is_finite() {
            return Err(LocationError::DistanceFailed(format!(
                "non-finite distance from {position:?}"
            ))
            .into());
        }
        let is_present = distance_m <= GEOFENCE_RADIUS_METERS;

        // Appended unconditionally, even when the hour already has a
        // sample: the aggregator tolerates duplicates.
        let timestamp = align_to_hour(now);
        self.db.append_sample(timestamp, is_present)?;
        tracing::debug!(%timestamp, distance_m, is_present, "presence sample recorded");

        let samples = self.db.all_samples()?;
        let days = attendance_days(&samples, gym.last_payment_date);
        let advance = match maybe_advance(&days, &gym) {
            Some(adv) => {
                self.db.update_rotation(adv.new_index, adv.advance_date)?;
                tracing::info!(
                    new_index = adv.new_index,
                    advance_date = %adv.advance_date,
                    "routine rotation advanced"
                );
                Some(adv)
            }
            None => None,
        };

        Ok(TickOutcome::Recorded {
            timestamp,
            distance_m,
            is_present,
            advance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Point;
    use crate::gym::GymConfig;
    use crate::position::StaticPosition;
    use chrono::TimeZone;

    const GYM: Point = Point {
        latitude: -34.6037,
        longitude: -58.3816,
    };

    /// Provider whose fix always fails; permission is granted.
    struct NoFix;

    impl PositionProvider for NoFix {
        fn ensure_permissions(&self) -> Result<(), LocationError> {
            Ok(())
        }
        fn current_position(&self) -> Result<Point, LocationError> {
            Err(LocationError::PositionUnavailable("no fix".into()))
        }
    }

    /// Provider that refuses permission.
    struct Denied;

    impl PositionProvider for Denied {
        fn ensure_permissions(&self) -> Result<(), LocationError> {
            Err(LocationError::PermissionDenied)
        }
        fn current_position(&self) -> Result<Point, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    fn db_with_gym(routines: &[&str]) -> Database {
        let db = Database::open_memory().unwrap();
        let mut gym = GymConfig::new("Iron Temple", GYM.latitude, GYM.longitude);
        gym.routine_names = routines.iter().map(|s| s.to_string()).collect();
        db.save_gym_config(&gym).unwrap();
        db
    }

    fn at(d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, min, 0).unwrap()
    }

    #[test]
    fn start_requires_configured_gym() {
        let db = Database::open_memory().unwrap();
        let sampler = GeofenceSampler::new(&db, StaticPosition(GYM));
        assert!(matches!(
            sampler.start_tracking(),
            Err(CoreError::GymNotConfigured)
        ));
        assert_eq!(sampler.state().unwrap(), TrackerState::Idle);
    }

    #[test]
    fn start_requires_permission() {
        let db = db_with_gym(&["A"]);
        let sampler = GeofenceSampler::new(&db, Denied);
        assert!(matches!(
            sampler.start_tracking(),
            Err(CoreError::Location(LocationError::PermissionDenied))
        ));
        assert_eq!(sampler.state().unwrap(), TrackerState::Idle);
    }

    #[test]
    fn start_and_stop_roundtrip() {
        let db = db_with_gym(&["A"]);
        let sampler = GeofenceSampler::new(&db, StaticPosition(GYM));
        sampler.start_tracking().unwrap();
        assert_eq!(sampler.state().unwrap(), TrackerState::Tracking);
        // Starting again is a no-op, not an error.
        sampler.start_tracking().unwrap();
        sampler.stop_tracking().unwrap();
        assert_eq!(sampler.state().unwrap(), TrackerState::Idle);
    }

    #[test]
    fn tick_while_idle_is_noop() {
        let db = db_with_gym(&["A"]);
        let sampler = GeofenceSampler::new(&db, StaticPosition(GYM));
        assert_eq!(sampler.record_tick(at(1, 10, 0)), TickOutcome::NotTracking);
        assert!(db.all_samples().unwrap().is_empty());
    }

    #[test]
    fn tick_without_gym_is_silent_noop() {
        let db = Database::open_memory().unwrap();
        // Simulate a stale tracking flag left behind after the gym row was
        // never written (fresh install restoring old kv state).
        db.kv_set("tracking_active", "true").unwrap();
        let sampler = GeofenceSampler::new(&db, StaticPosition(GYM));
        assert_eq!(
            sampler.record_tick(at(1, 10, 0)),
            TickOutcome::NoGymConfigured
        );
        assert!(db.all_samples().unwrap().is_empty());
    }

    #[test]
    fn tick_records_hour_aligned_presence() {
        let db = db_with_gym(&["A", "B"]);
        let sampler = GeofenceSampler::new(&db, StaticPosition(GYM));
        sampler.start_tracking().unwrap();

        let outcome = sampler.record_tick(at(1, 10, 42));
        match outcome {
            TickOutcome::Recorded {
                timestamp,
                is_present,
                ..
            } => {
                assert_eq!(timestamp, at(1, 10, 0));
                assert!(is_present);
            }
            other => panic!("expected Recorded, got {other:?}"),
        }
        assert_eq!(db.all_samples().unwrap().len(), 1);
    }

    #[test]
    fn tick_outside_radius_records_absence() {
        let db = db_with_gym(&["A"]);
        // ~1.1 km north of the gym.
        let away = Point::new(GYM.latitude + 0.01, GYM.longitude);
        let sampler = GeofenceSampler::new(&db, StaticPosition(away));
        sampler.start_tracking().unwrap();

        match sampler.record_tick(at(1, 10, 0)) {
            TickOutcome::Recorded {
                is_present,
                advance,
                ..
            } => {
                assert!(!is_present);
                assert_eq!(advance, None);
            }
            other => panic!("expected Recorded, got {other:?}"),
        }
    }

    #[test]
    fn two_consecutive_hours_advance_routine_once() {
        let db = db_with_gym(&["A", "B", "C"]);
        let sampler = GeofenceSampler::new(&db, StaticPosition(GYM));
        sampler.start_tracking().unwrap();

        match sampler.record_tick(at(1, 10, 0)) {
            TickOutcome::Recorded { advance, .. } => assert_eq!(advance, None),
            other => panic!("expected Recorded, got {other:?}"),
        }

        match sampler.record_tick(at(1, 11, 0)) {
            TickOutcome::Recorded { advance, .. } => {
                let adv = advance.expect("second consecutive hour should advance");
                assert_eq!(adv.new_index, 1);
            }
            other => panic!("expected Recorded, got {other:?}"),
        }

        // Further ticks on the same day must not advance again.
        match sampler.record_tick(at(1, 12, 0)) {
            TickOutcome::Recorded { advance, .. } => assert_eq!(advance, None),
            other => panic!("expected Recorded, got {other:?}"),
        }

        let gym = db.gym_config().unwrap().unwrap();
        assert_eq!(gym.current_routine_index, 1);
        assert_eq!(
            gym.last_routine_advance_date,
            Some(at(1, 0, 0).date_naive())
        );
    }

    #[test]
    fn duplicate_tick_in_same_hour_is_harmless() {
        let db = db_with_gym(&["A", "B"]);
        let sampler = GeofenceSampler::new(&db, StaticPosition(GYM));
        sampler.start_tracking().unwrap();

        sampler.record_tick(at(1, 10, 5));
        sampler.record_tick(at(1, 10, 55)); // same hour, redundant tick

        // Two rows, same hour; no attendance day yet, so no advance.
        assert_eq!(db.all_samples().unwrap().len(), 2);
        let gym = db.gym_config().unwrap().unwrap();
        assert_eq!(gym.current_routine_index, 0);
        assert_eq!(gym.last_routine_advance_date, None);
    }

    #[test]
    fn position_failure_aborts_tick_silently() {
        let db = db_with_gym(&["A"]);
        db.kv_set("tracking_active", "true").unwrap();
        let sampler = GeofenceSampler::new(&db, NoFix);

        assert_eq!(sampler.record_tick(at(1, 10, 0)), TickOutcome::Aborted);
        assert!(db.all_samples().unwrap().is_empty());
        // Failures never auto-stop tracking.
        assert_eq!(sampler.state().unwrap(), TrackerState::Tracking);
    }

    #[test]
    fn empty_routine_list_detects_day_but_never_advances() {
        let db = db_with_gym(&[]);
        let sampler = GeofenceSampler::new(&db, StaticPosition(GYM));
        sampler.start_tracking().unwrap();

        sampler.record_tick(at(1, 10, 0));
        sampler.record_tick(at(1, 11, 0));

        let gym = db.gym_config().unwrap().unwrap();
        assert_eq!(gym.last_routine_advance_date, None);
        assert_eq!(gym.current_routine_index, 0);
    }
}
