//! # Gymlog Core Library
//!
//! Core business logic for Gymlog, a gym-attendance tracker. The engine is
//! CLI-first: everything is available through a standalone CLI binary, with
//! any GUI being a thin layer over this same library.
//!
//! ## Architecture
//!
//! - **Geofence Sampler**: a two-state (Idle/Tracking) machine fed by an
//!   external scheduler; each tick classifies presence against the
//!   configured gym and appends one hour-aligned sample
//! - **Attendance Aggregator**: pure functions deriving attendance days and
//!   statistics from the full sample log
//! - **Routine Rotation**: a cyclic pointer into the configured routine
//!   list, advanced at most once per attendance day
//! - **Storage**: SQLite sample log and gym configuration, TOML app config
//!
//! ## Key Components
//!
//! - [`GeofenceSampler`]: background tick entry point
//! - [`compute_attendance_stats`]: statistics for the gym screen
//! - [`maybe_advance`]: the rotation decision
//! - [`Database`]: sample and configuration persistence

pub mod attendance;
pub mod error;
pub mod geo;
pub mod gym;
pub mod position;
pub mod rotation;
pub mod sampler;
pub mod storage;

pub use attendance::{
    align_to_hour, attendance_days, compute_attendance_stats, AttendanceStats, MonthlyCount,
    VisitEntry,
};
pub use error::{ConfigError, CoreError, DatabaseError, LocationError};
pub use geo::{haversine_meters, Point, GEOFENCE_RADIUS_METERS};
pub use gym::GymConfig;
pub use position::{PositionProvider, StaticPosition};
pub use rotation::{maybe_advance, RotationAdvance};
pub use sampler::{GeofenceSampler, TickOutcome, TrackerState};
pub use storage::{Config, Database, PresenceSample, TrackerConfig};
