//! Mapping between pointer offsets along the track and discrete ticks.
//!
//! Ticks are 1-indexed and include both endpoints: tick `1` sits at the left
//! edge of the track and tick `point_count` at the right edge.
//!
//! Rounding is round-half-up: an offset exactly halfway between two ticks
//! selects the higher one. On a 6-point scale the midpoint maps to
//! `1 + 0.5 * 5 = 3.5`, which selects tick 4.

/// Fraction of the track `[0, 1]` at which `tick` is drawn.
///
/// `point_count` must be at least 2; callers go through [`crate::Scale`],
/// which enforces that.
pub fn tick_to_fraction(tick: u32, point_count: u32) -> f64 {
    debug_assert!(point_count >= 2);
    (tick as f64 - 1.0) / (point_count as f64 - 1.0)
}

/// Tick selected by a pointer at `client_offset` along a track of
/// `track_length`. Offsets outside the track clamp to the nearest edge.
pub fn position_to_tick(client_offset: f64, track_length: f64, point_count: u32) -> u32 {
    debug_assert!(point_count >= 2);
    let p = offset_to_fraction(client_offset, track_length);
    let raw = round_half_up(1.0 + p * (point_count as f64 - 1.0));
    (raw as u32).clamp(1, point_count)
}

/// Track offset of the centre of `tick`, the inverse of [`position_to_tick`].
pub fn tick_to_offset(tick: u32, point_count: u32, track_length: f64) -> f64 {
    tick_to_fraction(tick, point_count) * track_length
}

/// Fractions at which dividers between ticks are drawn: every tick strictly
/// between the first and the last.
pub fn divider_fractions(point_count: u32) -> impl Iterator<Item = f64> {
    (2..point_count).map(move |tick| tick_to_fraction(tick, point_count))
}

fn offset_to_fraction(client_offset: f64, track_length: f64) -> f64 {
    // A collapsed track has no extent to select on; everything maps to the first tick.
    if !(track_length > 0.0) || !track_length.is_finite() {
        return 0.0;
    }
    if client_offset.is_nan() {
        return 0.0;
    }
    client_offset.clamp(0.0, track_length) / track_length
}

fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}
