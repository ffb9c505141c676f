use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::{FakeHomeAssistant, FakeStats};
use crate::core::unit::{DegreeCelsius, Percent};
use crate::core::{EntityId, ServiceCall};
use crate::heating::{ActuationOutcome, BoilerMode, HeatingConfig, HeatingController, StatName, StatValue};

fn config(trvs: &[&str], boiler: Option<&str>) -> HeatingConfig {
    HeatingConfig {
        trv_entities: trvs.iter().map(|id| EntityId::from(*id)).collect(),
        boiler_entity: boiler.map(EntityId::from),
        ..Default::default()
    }
}

fn thermostat(ha: FakeHomeAssistant, temperature: f64, preset: &str) -> FakeHomeAssistant {
    ha.with_entity(
        "climate.boiler",
        "heat",
        json!({
            "current_temperature": 16.0,
            "temperature": temperature,
            "preset_mode": preset,
        }),
    )
}

fn set_temperature(value: f64) -> ServiceCall {
    ServiceCall::new("climate", "set_temperature", &EntityId::from("climate.boiler")).with("temperature", value)
}

fn set_preset(preset: &str) -> ServiceCall {
    ServiceCall::new("climate", "set_preset_mode", &EntityId::from("climate.boiler")).with("preset_mode", preset)
}

#[tokio::test]
async fn dynamic_target_from_average_valve_position() {
    let ha = FakeHomeAssistant::new()
        .with_trv("climate.bedroom_trv", "heating")
        .with_state("sensor.bedroom_trv_valve_position", "10")
        .with_trv("climate.office_trv", "heating")
        .with_state("sensor.office_trv_valve_position", "40")
        .with_trv("climate.hall_trv", "idle")
        .with_state("sensor.hall_trv_valve_position", "90");
    let ha = thermostat(ha, 14.0, "none");
    let stats = FakeStats::default();
    let config = HeatingConfig {
        use_dynamic_temperature: true,
        ..config(
            &["climate.bedroom_trv", "climate.office_trv", "climate.hall_trv"],
            Some("climate.boiler"),
        )
    };

    let report = HeatingController::new(&ha, &stats, config).run_cycle().await;

    assert_eq!(report.readings.len(), 3);
    assert_eq!(report.demand.demanding_count, 2);
    assert_eq!(report.demand.average_valve_position, Some(Percent(25.0)));
    assert_eq!(
        report.decision.and_then(|d| d.target_temperature),
        Some(DegreeCelsius(16.5))
    );
    assert_eq!(report.outcome, Some(ActuationOutcome::Applied));
    assert_eq!(ha.calls(), vec![set_preset("none"), set_temperature(16.5)]);
    assert_eq!(stats.last(StatName::TargetTemperature), Some(StatValue::Number(Some(16.5))));
}

#[tokio::test]
async fn toggle_boiler_is_switched_off_once() {
    let ha = FakeHomeAssistant::new()
        .with_trv("climate.bedroom_trv", "idle")
        .with_state("switch.boiler", "on");
    let stats = FakeStats::default();
    let config = HeatingConfig {
        boiler_mode: BoilerMode::Toggle,
        ..config(&["climate.bedroom_trv"], Some("switch.boiler"))
    };
    let mut controller = HeatingController::new(&ha, &stats, config);

    let first = controller.run_cycle().await;
    let second = controller.run_cycle().await;

    assert_eq!(first.outcome, Some(ActuationOutcome::Applied));
    assert_eq!(second.outcome, Some(ActuationOutcome::Unchanged));
    assert_eq!(
        ha.calls(),
        vec![ServiceCall::new("switch", "turn_off", &EntityId::from("switch.boiler"))]
    );
    assert_eq!(stats.last(StatName::BoilerMode), Some(StatValue::Label("toggle")));
    assert_eq!(stats.last(StatName::TargetTemperature), Some(StatValue::Number(None)));
}

#[tokio::test]
async fn toggle_boiler_uses_entity_domain() {
    let ha = FakeHomeAssistant::new()
        .with_trv("climate.bedroom_trv", "heating")
        .with_state("input_boolean.boiler", "off");
    let stats = FakeStats::default();
    let config = HeatingConfig {
        boiler_mode: BoilerMode::Toggle,
        ..config(&["climate.bedroom_trv"], Some("input_boolean.boiler"))
    };

    HeatingController::new(&ha, &stats, config).run_cycle().await;

    assert_eq!(
        ha.calls(),
        vec![ServiceCall::new("input_boolean", "turn_on", &EntityId::from("input_boolean.boiler"))]
    );
}

#[tokio::test]
async fn non_numeric_position_still_counts_as_demand() {
    let ha = FakeHomeAssistant::new()
        .with_trv("climate.bedroom_trv", "heating")
        .with_state("sensor.bedroom_trv_valve_position", "unknown");
    let ha = thermostat(ha, 14.0, "schedule");
    let stats = FakeStats::default();
    let config = HeatingConfig {
        use_dynamic_temperature: true,
        ..config(&["climate.bedroom_trv"], Some("climate.boiler"))
    };

    let report = HeatingController::new(&ha, &stats, config).run_cycle().await;

    assert_eq!(report.demand.demanding_count, 1);
    assert_eq!(report.demand.average_valve_position, None);
    assert_eq!(ha.calls(), vec![set_preset("none"), set_temperature(21.0)]);
    assert_eq!(stats.last(StatName::AverageValvePosition), Some(StatValue::Number(None)));
}

#[tokio::test]
async fn boiler_already_at_target_is_left_alone() {
    let ha = FakeHomeAssistant::new().with_trv("climate.bedroom_trv", "heating");
    let ha = thermostat(ha, 14.0, "manual");
    let stats = FakeStats::default();
    let mut controller = HeatingController::new(&ha, &stats, config(&["climate.bedroom_trv"], Some("climate.boiler")));

    let first = controller.run_cycle().await;
    let second = controller.run_cycle().await;

    assert_eq!(first.outcome, Some(ActuationOutcome::Applied));
    assert_eq!(second.outcome, Some(ActuationOutcome::Unchanged));
    assert_eq!(ha.calls(), vec![set_preset("none"), set_temperature(21.0)]);
}

#[tokio::test]
async fn too_few_heating_trvs_keep_boiler_idle() {
    let ha = FakeHomeAssistant::new()
        .with_trv("climate.bedroom_trv", "heating")
        .with_trv("climate.office_trv", "idle");
    let ha = thermostat(ha, 21.0, "away");
    let stats = FakeStats::default();
    let config = HeatingConfig {
        min_trvs_heating: 2,
        ..config(&["climate.bedroom_trv", "climate.office_trv"], Some("climate.boiler"))
    };

    let report = HeatingController::new(&ha, &stats, config).run_cycle().await;

    assert!(report.demand.any_heating);
    assert!(!report.demand.sufficient_demand);
    assert_eq!(ha.calls(), vec![set_preset("none"), set_temperature(14.0)]);
    assert_eq!(stats.last(StatName::HeatingActive), Some(StatValue::Flag(true)));
    assert_eq!(stats.last(StatName::TrvsDemanding), Some(StatValue::Count(1)));
}

#[tokio::test]
async fn unavailable_valve_sensor_fails_open() {
    let ha = FakeHomeAssistant::new()
        .with_trv("climate.bedroom_trv", "heating")
        .with_state("binary_sensor.bedroom_trv_valve_state", "unavailable");
    let ha = thermostat(ha, 14.0, "none");
    let stats = FakeStats::default();

    let report = HeatingController::new(&ha, &stats, config(&["climate.bedroom_trv"], Some("climate.boiler")))
        .run_cycle()
        .await;

    assert!(report.demand.sufficient_demand);
    assert_eq!(ha.calls(), vec![set_preset("none"), set_temperature(21.0)]);
}

#[tokio::test]
async fn closed_valve_suppresses_heating() {
    let ha = FakeHomeAssistant::new()
        .with_trv("climate.bedroom_trv", "heating")
        .with_state("binary_sensor.bedroom_valve_state", "closed");
    let ha = thermostat(ha, 14.0, "none");
    let stats = FakeStats::default();

    let report = HeatingController::new(&ha, &stats, config(&["climate.bedroom_trv"], Some("climate.boiler")))
        .run_cycle()
        .await;

    assert!(!report.demand.any_heating);
    assert_eq!(report.outcome, Some(ActuationOutcome::Unchanged));
    assert!(ha.calls().is_empty());
}

#[tokio::test]
async fn unreadable_boiler_is_written_without_preset() {
    let ha = FakeHomeAssistant::new().with_trv("climate.bedroom_trv", "heating");
    let stats = FakeStats::default();

    let report = HeatingController::new(&ha, &stats, config(&["climate.bedroom_trv"], Some("climate.boiler")))
        .run_cycle()
        .await;

    assert_eq!(report.outcome, Some(ActuationOutcome::Applied));
    assert_eq!(ha.calls(), vec![set_temperature(21.0)]);
}

#[tokio::test]
async fn unreachable_trvs_do_not_demand() {
    let ha = thermostat(FakeHomeAssistant::new(), 21.0, "none");
    let stats = FakeStats::default();

    let report = HeatingController::new(&ha, &stats, config(&["climate.bedroom_trv"], Some("climate.boiler")))
        .run_cycle()
        .await;

    assert!(!report.demand.any_heating);
    assert_eq!(ha.calls(), vec![set_preset("none"), set_temperature(14.0)]);
}

#[tokio::test]
async fn without_boiler_only_stats_are_published() {
    let ha = FakeHomeAssistant::new().with_trv("climate.bedroom_trv", "heating");
    let stats = FakeStats::default();
    let mut controller = HeatingController::new(&ha, &stats, config(&["climate.bedroom_trv"], None));

    let first = controller.run_cycle().await;
    let second = controller.run_cycle().await;

    assert_eq!(first.decision, None);
    assert_eq!(second.outcome, None);
    assert!(ha.calls().is_empty());
    assert_eq!(stats.published().len(), 2 * StatName::ALL.len());
    assert_eq!(stats.last(StatName::HeatingActive), Some(StatValue::Flag(true)));
}

#[tokio::test]
async fn empty_configuration_is_a_no_op() {
    let ha = FakeHomeAssistant::new();
    let stats = FakeStats::default();

    let report = HeatingController::new(&ha, &stats, HeatingConfig::default())
        .run_cycle()
        .await;

    assert!(report.readings.is_empty());
    assert!(ha.calls().is_empty());
    assert_eq!(stats.last(StatName::TrvsDemanding), Some(StatValue::Count(0)));
}

#[tokio::test]
async fn failed_write_is_retried_next_cycle_only() {
    let ha = FakeHomeAssistant::new()
        .with_trv("climate.bedroom_trv", "heating")
        .rejecting_service("climate.set_temperature");
    let ha = thermostat(ha, 14.0, "none");
    let stats = FakeStats::default();
    let mut controller = HeatingController::new(&ha, &stats, config(&["climate.bedroom_trv"], Some("climate.boiler")));

    let first = controller.run_cycle().await;
    assert_eq!(first.outcome, Some(ActuationOutcome::Failed));
    assert_eq!(ha.calls(), vec![set_preset("none"), set_temperature(21.0)]);
    assert_eq!(stats.published().len(), StatName::ALL.len());

    controller.run_cycle().await;
    assert_eq!(
        ha.calls(),
        vec![
            set_preset("none"),
            set_temperature(21.0),
            set_preset("none"),
            set_temperature(21.0)
        ]
    );
}

#[tokio::test]
async fn away_preset_is_left_for_manual_override() {
    let ha = FakeHomeAssistant::new().with_trv("climate.bedroom_trv", "heating");
    let ha = thermostat(ha, 14.0, "away");
    let stats = FakeStats::default();

    HeatingController::new(&ha, &stats, config(&["climate.bedroom_trv"], Some("climate.boiler")))
        .run_cycle()
        .await;

    assert_eq!(ha.calls(), vec![set_preset("none"), set_temperature(21.0)]);
    let boiler = ha.state_of("climate.boiler").unwrap();
    assert_eq!(boiler.attribute_str("preset_mode"), Some("none"));
}

#[tokio::test]
async fn idle_trvs_skip_position_sensors() {
    let ha = FakeHomeAssistant::new()
        .with_trv("climate.bedroom_trv", "idle")
        .with_state("sensor.bedroom_trv_valve_position", "60")
        .with_trv("climate.office_trv", "heating")
        .with_state("sensor.office_trv_valve_position", "40");
    let ha = thermostat(ha, 21.0, "none");
    let stats = FakeStats::default();

    let report = HeatingController::new(
        &ha,
        &stats,
        config(&["climate.bedroom_trv", "climate.office_trv"], Some("climate.boiler")),
    )
    .run_cycle()
    .await;

    assert_eq!(ha.reads_of("sensor.bedroom_trv_valve_position"), 0);
    assert_eq!(ha.reads_of("sensor.office_trv_valve_position"), 1);
    assert_eq!(report.readings[0].valve_position, None);
    assert_eq!(report.demand.average_valve_position, Some(Percent(40.0)));
}

#[tokio::test]
async fn falls_back_to_next_preset() {
    let ha = FakeHomeAssistant::new()
        .with_trv("climate.bedroom_trv", "heating")
        .rejecting_preset("none");
    let ha = thermostat(ha, 14.0, "schedule");
    let stats = FakeStats::default();

    HeatingController::new(&ha, &stats, config(&["climate.bedroom_trv"], Some("climate.boiler")))
        .run_cycle()
        .await;

    assert_eq!(
        ha.calls(),
        vec![set_preset("none"), set_preset("manual"), set_temperature(21.0)]
    );
    let boiler = ha.state_of("climate.boiler").unwrap();
    assert_eq!(boiler.attribute_str("preset_mode"), Some("manual"));
}

#[tokio::test]
async fn position_only_policy_skips_valve_sensors() {
    let ha = FakeHomeAssistant::new()
        .with_trv("climate.bedroom_trv", "idle")
        .with_state("sensor.bedroom_trv_valve_position", "30");
    let ha = thermostat(ha, 14.0, "none");
    let stats = FakeStats::default();
    let config = HeatingConfig {
        ignore_hvac_action: true,
        min_valve_position_threshold: 20.0,
        ..config(&["climate.bedroom_trv"], Some("climate.boiler"))
    };

    let report = HeatingController::new(&ha, &stats, config).run_cycle().await;

    assert!(report.demand.sufficient_demand);
    assert_eq!(ha.reads_of("binary_sensor.bedroom_trv_valve_state"), 0);
    assert_eq!(ha.calls(), vec![set_preset("none"), set_temperature(21.0)]);
}

#[tokio::test]
async fn stops_after_cycle_when_cancelled() {
    let ha = FakeHomeAssistant::new();
    let stats = FakeStats::default();
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    HeatingController::new(&ha, &stats, HeatingConfig::default())
        .run(shutdown)
        .await;

    assert_eq!(stats.announced(), 1);
    assert_eq!(stats.published().len(), StatName::ALL.len());
}
