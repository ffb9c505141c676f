use tokio_util::sync::CancellationToken;

use crate::port::{EntityStateAccess, ServiceCallAccess, StatsSink};

use super::boiler::{BoilerPlan, apply_plan};
use super::trv::{ReadOptions, read_trv};
use super::{ActuationOutcome, BoilerDecision, CycleStats, DemandPolicy, DemandSnapshot, HeatingConfig, TrvReading};

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub readings: Vec<TrvReading>,
    pub demand: DemandSnapshot,
    pub decision: Option<BoilerDecision>,
    pub outcome: Option<ActuationOutcome>,
}

pub struct HeatingController<A, S> {
    api: A,
    stats: S,
    config: HeatingConfig,
    policy: DemandPolicy,
    warned_missing_boiler: bool,
}

impl<A, S> HeatingController<A, S>
where
    A: EntityStateAccess + ServiceCallAccess,
    S: StatsSink,
{
    pub fn new(api: A, stats: S, config: HeatingConfig) -> Self {
        let policy = config.demand_policy();

        Self {
            api,
            stats,
            config,
            policy,
            warned_missing_boiler: false,
        }
    }

    /// Polls until `shutdown` fires. Shutdown is only observed between cycles.
    pub async fn run(mut self, shutdown: CancellationToken) {
        self.stats.announce().await;

        let interval = self.config.polling_interval();

        loop {
            self.run_cycle().await;

            tracing::debug!("Sleeping for {} seconds...", interval.as_secs());

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutting down heating manager");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    #[tracing::instrument(name = "heating_cycle", skip(self))]
    pub async fn run_cycle(&mut self) -> CycleReport {
        tracing::info!("Polling {} TRV entities...", self.config.trv_entities.len());

        let options = ReadOptions {
            valve_state: self.policy.reads_valve_state(),
            idle_position: self.policy.reads_idle_position(),
        };

        let mut readings = Vec::with_capacity(self.config.trv_entities.len());
        for trv in self.config.trv_entities.iter() {
            let reading = read_trv(&self.api, trv, options).await;
            log_reading(&reading, self.policy.is_demanding(&reading));
            readings.push(reading);
        }

        let demand = DemandSnapshot::aggregate(&readings, &self.policy, self.config.min_trvs_heating);

        tracing::info!(
            "Demand: {} TRVs heating (minimum {}), average valve position {}, sufficient: {}",
            demand.demanding_count,
            self.config.min_trvs_heating,
            demand
                .average_valve_position
                .map_or_else(|| "n/a".to_owned(), |p| p.to_string()),
            demand.sufficient_demand
        );

        let (decision, outcome) = match self.config.boiler() {
            Some(boiler) => {
                let boiler_state = self.api.read_entity(boiler).await;
                if boiler_state.is_none() {
                    tracing::warn!("Could not retrieve state for boiler {}", boiler);
                }

                let decision = BoilerDecision::decide(&self.config, &demand, boiler_state.as_ref());
                match (decision.activate, decision.target_temperature) {
                    (true, Some(t)) => tracing::info!("Heating demand present - boiler target {}", t),
                    (true, None) => tracing::info!("Heating demand present - turning on boiler"),
                    (false, Some(t)) => tracing::info!("No sufficient heating demand - boiler target {}", t),
                    (false, None) => tracing::info!("No sufficient heating demand - turning off boiler"),
                }

                let plan = BoilerPlan::for_decision(&decision, boiler_state.as_ref());
                let outcome = apply_plan(&self.api, boiler, &plan).await;

                (Some(decision), Some(outcome))
            }
            None => {
                if demand.any_heating && !self.warned_missing_boiler {
                    tracing::warn!("TRVs are heating but no boiler entity configured");
                    self.warned_missing_boiler = true;
                }
                (None, None)
            }
        };

        CycleStats::new(&demand, decision.as_ref(), self.config.boiler_mode)
            .publish(&self.stats)
            .await;

        CycleReport {
            readings,
            demand,
            decision,
            outcome,
        }
    }
}

fn log_reading(reading: &TrvReading, demanding: bool) {
    let Some(state) = &reading.reported_state else {
        return;
    };

    tracing::info!("TRV {}:", reading.entity_id);
    tracing::info!("  State: {}", state);
    if let Some(current) = reading.current_temperature {
        tracing::info!("  Current temp: {}", current);
    }
    if let Some(target) = reading.target_temperature {
        tracing::info!("  Target temp: {}", target);
    }
    if let Some(action) = &reading.hvac_action {
        tracing::info!("  HVAC action: {}", action);
    }
    tracing::debug!("  Valve state: {}", reading.valve);
    if let Some(position) = reading.valve_position {
        tracing::info!("  Valve position: {}", position);
    }

    if demanding {
        tracing::info!("  -> TRV is demanding heat");
    } else if reading.is_hvac_heating() {
        tracing::info!("  -> TRV reports heating but demand is suppressed");
    }
}
