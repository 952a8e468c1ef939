use crate::geometry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fewest points a rating scale can have.
pub const MIN_POINT_COUNT: u32 = 2;

/// One selectable position on a scale, numbered `1..=point_count`.
///
/// Deserializing checks the lower bound only; the upper bound belongs to
/// the scale the tick is read against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Tick(u32);

impl Tick {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// A tick number outside the positions of any scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTick(pub u32);

impl fmt::Display for InvalidTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick {} is not a scale position; ticks start at 1", self.0)
    }
}

impl std::error::Error for InvalidTick {}

impl TryFrom<u32> for Tick {
    type Error = InvalidTick;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(InvalidTick(value));
        }
        Ok(Tick(value))
    }
}

impl From<Tick> for u32 {
    fn from(tick: Tick) -> Self {
        tick.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-trial scale configuration. Immutable once the trial starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scale {
    point_count: u32,
    require_response: bool,
}

impl Scale {
    /// Builds a scale, raising any `requested_points` below
    /// [`MIN_POINT_COUNT`] to the minimum.
    pub fn new(requested_points: i64, require_response: bool) -> Self {
        let point_count = if requested_points < MIN_POINT_COUNT as i64 {
            log::warn!(
                "[confidence-rating] point count {} is below {}; using {}",
                requested_points,
                MIN_POINT_COUNT,
                MIN_POINT_COUNT
            );
            MIN_POINT_COUNT
        } else {
            u32::try_from(requested_points).unwrap_or(u32::MAX)
        };
        Self {
            point_count,
            require_response,
        }
    }

    pub fn point_count(&self) -> u32 {
        self.point_count
    }

    pub fn require_response(&self) -> bool {
        self.require_response
    }

    pub fn first(&self) -> Tick {
        Tick(1)
    }

    pub fn last(&self) -> Tick {
        Tick(self.point_count)
    }

    /// Returns the tick for `value` only if it lies on this scale.
    pub fn tick(&self, value: i64) -> Option<Tick> {
        (1..=self.point_count as i64)
            .contains(&value)
            .then(|| Tick(value as u32))
    }

    /// Returns the tick nearest to `value` on this scale.
    pub fn clamp_tick(&self, value: i64) -> Tick {
        Tick(value.clamp(1, self.point_count as i64) as u32)
    }

    /// The tick one step to the left, stopping at the first tick.
    pub fn step_down(&self, tick: Tick) -> Tick {
        Tick(tick.0.saturating_sub(1).max(1))
    }

    /// The tick one step to the right, stopping at the last tick.
    pub fn step_up(&self, tick: Tick) -> Tick {
        Tick(tick.0.saturating_add(1).min(self.point_count))
    }

    pub fn tick_to_fraction(&self, tick: Tick) -> f64 {
        geometry::tick_to_fraction(tick.0, self.point_count)
    }

    pub fn tick_to_offset(&self, tick: Tick, track_length: f64) -> f64 {
        geometry::tick_to_offset(tick.0, self.point_count, track_length)
    }

    pub fn position_to_tick(&self, offset: f64, track_length: f64) -> Tick {
        Tick(geometry::position_to_tick(
            offset,
            track_length,
            self.point_count,
        ))
    }

    pub fn divider_fractions(&self) -> impl Iterator<Item = f64> {
        geometry::divider_fractions(self.point_count)
    }

    pub fn ticks(&self) -> impl Iterator<Item = Tick> {
        (1..=self.point_count).map(Tick)
    }
}
