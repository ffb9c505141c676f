use crate::core::unit::{DegreeCelsius, Percent};

/// Valve opening at which the target reaches the boiler's own temperature plus a nudge.
const KINK_POSITION: f64 = 25.0;
const KINK_OFFSET: DegreeCelsius = DegreeCelsius(0.5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureBounds {
    pub on: DegreeCelsius,
    pub off: DegreeCelsius,
}

/// Target boiler temperature for an average valve opening.
///
/// Two linear segments: `off` at 0 % up to `base + 0.5` at 25 %, then up to `on` at 100 %.
/// The result is clamped into `[off, on]` and rounded to half degrees. `base` is the boiler's
/// current temperature and falls back to `off` when unknown.
pub fn dynamic_target(
    average_position: Percent,
    base: Option<DegreeCelsius>,
    bounds: &TemperatureBounds,
) -> DegreeCelsius {
    let TemperatureBounds { on, off } = *bounds;
    let position = average_position.clamp().0;

    let anchor = base.unwrap_or(off) + KINK_OFFSET;

    let target = if position <= 0.0 {
        off
    } else if position <= KINK_POSITION {
        off + (anchor - off) * (position / KINK_POSITION)
    } else {
        anchor + (on - anchor) * ((position - KINK_POSITION) / (100.0 - KINK_POSITION))
    };

    target.clamp(off, on).round_to_half()
}
