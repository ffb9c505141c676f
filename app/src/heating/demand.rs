use crate::core::unit::Percent;

use super::TrvReading;

/// How a single TRV's reading is turned into a demand verdict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DemandPolicy {
    /// Trust `hvac_action == heating`, gated by the valve sensor and, when available, the valve position.
    HvacAction {
        check_valve_state: bool,
        min_valve_position: Percent,
    },
    /// Only a reported valve position above the threshold counts.
    PositionOnly { min_valve_position: Percent },
}

impl DemandPolicy {
    pub fn is_demanding(&self, reading: &TrvReading) -> bool {
        match self {
            DemandPolicy::HvacAction {
                check_valve_state,
                min_valve_position,
            } => {
                if !reading.is_hvac_heating() {
                    return false;
                }

                if *check_valve_state && !reading.valve.permits_flow() {
                    return false;
                }

                //without a position sensor the hvac action is ground truth
                match reading.valve_position {
                    Some(position) if min_valve_position.0 > 0.0 => position > *min_valve_position,
                    _ => true,
                }
            }
            DemandPolicy::PositionOnly { min_valve_position } => reading
                .valve_position
                .is_some_and(|position| position > *min_valve_position),
        }
    }

    /// Only a position-based verdict can turn a non-heating TRV into demand.
    pub fn reads_idle_position(&self) -> bool {
        matches!(self, DemandPolicy::PositionOnly { .. })
    }

    pub fn reads_valve_state(&self) -> bool {
        matches!(
            self,
            DemandPolicy::HvacAction {
                check_valve_state: true,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemandSnapshot {
    pub any_heating: bool,
    pub demanding_count: usize,
    /// Mean position of the demanding TRVs that reported one.
    pub average_valve_position: Option<Percent>,
    pub sufficient_demand: bool,
}

impl DemandSnapshot {
    pub fn aggregate(readings: &[TrvReading], policy: &DemandPolicy, min_trvs_heating: usize) -> Self {
        let demanding: Vec<&TrvReading> = readings.iter().filter(|r| policy.is_demanding(r)).collect();

        let positions: Vec<Percent> = demanding.iter().filter_map(|r| r.valve_position).collect();

        let any_heating = !demanding.is_empty();
        let demanding_count = demanding.len();

        Self {
            any_heating,
            demanding_count,
            average_valve_position: Percent::mean(&positions),
            sufficient_demand: any_heating && demanding_count >= min_trvs_heating,
        }
    }

    pub fn none() -> Self {
        Self {
            any_heating: false,
            demanding_count: 0,
            average_valve_position: None,
            sufficient_demand: false,
        }
    }
}
