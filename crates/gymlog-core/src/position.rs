//! Position acquisition trait.
//!
//! The host platform owns geolocation and its permission model; the core
//! only sees this trait. The sampler calls `ensure_permissions` once when
//! tracking starts and `current_position` on every tick.

use crate::error::LocationError;
use crate::geo::Point;

pub trait PositionProvider {
    /// Verify that foreground and background location access is granted.
    ///
    /// # Errors
    /// Returns `LocationError::PermissionDenied` when access is refused.
    fn ensure_permissions(&self) -> Result<(), LocationError>;

    /// Obtain the current position.
    ///
    /// # Errors
    /// Returns `LocationError::PositionUnavailable` when no fix is
    /// available. Treated as transient by the sampler.
    fn current_position(&self) -> Result<Point, LocationError>;
}

/// A provider pinned to a fixed coordinate. Used by the CLI (which receives
/// the device position as arguments) and by tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticPosition(pub Point);

impl PositionProvider for StaticPosition {
    fn ensure_permissions(&self) -> Result<(), LocationError> {
        Ok(())
    }

    fn current_position(&self) -> Result<Point, LocationError> {
        Ok(self.0)
    }
}
