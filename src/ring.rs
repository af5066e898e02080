//! The closed single-lane road the vehicles drive around.

use crate::error::{SimError, SimResult};

/// A single-lane road whose end joins back onto its start.
///
/// Positions live on the half-open span `[origin, origin + length)`.
/// A vehicle that drives past the end re-enters at `origin`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingTopology {
    /// The re-entry coordinate in m.
    origin: f64,
    /// The length of the loop in m.
    length: f64,
}

impl RingTopology {
    /// Creates a ring of the given `length` whose re-entry coordinate is `origin`.
    pub fn new(origin: f64, length: f64) -> SimResult<Self> {
        if !origin.is_finite() {
            return Err(SimError::Topology(format!("origin {origin} is not finite")));
        }
        if !(length.is_finite() && length > 0.0) {
            return Err(SimError::Topology(format!(
                "road length must be positive, got {length}"
            )));
        }
        Ok(Self { origin, length })
    }

    /// Creates a ring spanning `[origin, end)`.
    pub fn spanning(origin: f64, end: f64) -> SimResult<Self> {
        Self::new(origin, end - origin)
    }

    /// The length of the loop in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The coordinate at which vehicles re-enter the road, in m.
    pub fn origin(&self) -> f64 {
        self.origin
    }

    /// The coordinate past which vehicles wrap back to the origin, in m.
    pub fn end(&self) -> f64 {
        self.origin + self.length
    }

    /// The distance travelled going forward from `from` to `to`.
    ///
    /// The result lies in `(0, length]` for positions on the road. Two coincident
    /// positions are a full lap apart, which is what a lone vehicle sees when it
    /// looks for the vehicle ahead of itself. Distinct vehicles sharing a position
    /// are resolved by [VehicleState::lead_gap](crate::VehicleState::lead_gap).
    pub fn forward_gap(&self, from: f64, to: f64) -> f64 {
        if from < to {
            to - from
        } else {
            (self.end() - from) + (to - self.origin)
        }
    }

    /// Whether `pos` lies on the road, within `[origin, end)`.
    pub fn contains(&self, pos: f64) -> bool {
        pos >= self.origin && pos < self.end()
    }

    /// Maps a raw position back onto the road.
    ///
    /// Positions past the end re-enter at the origin, keeping whatever distance
    /// they had advanced beyond the end.
    pub fn wrap_position(&self, pos: f64) -> f64 {
        if pos >= self.end() || pos < self.origin {
            self.origin + (pos - self.origin).rem_euclid(self.length)
        } else {
            pos
        }
    }
}
