//! Invalidation bus and the mutations that drive it.

mod common;

use std::time::Duration;

use common::*;
use pulse_core::{CurrentStatusParams, DashboardError, ErrorKind, Method, PeriodParams};
use pulse_sync::query::{
    AllStationsQuery, CurrentStatusQuery, MachineHealthQuery, SystemHealthQuery,
};
use serde_json::json;

fn today() -> PeriodParams {
    PeriodParams::new("2024-01-01T00:00:00", "2024-01-01T23:59:59")
}

#[tokio::test(start_paused = true)]
async fn invalidated_key_is_refetched_while_fresh() {
    let transport = MockTransport::new();
    transport.respond(SYSTEM_HEALTH, system_health_body("JSW", 40.0));
    let client = client(&transport);
    let query = SystemHealthQuery::new(today());

    client.fetch(&query).await.unwrap();
    let result = client.invalidate_query(&query);
    assert_eq!(result.count, 1);

    let snapshot = client.peek(&query).unwrap();
    assert!(snapshot.is_stale);
    assert!(snapshot.has_value());

    client.fetch(&query).await.unwrap();
    assert_eq!(transport.calls(SYSTEM_HEALTH), 2);
    assert!(!client.peek(&query).unwrap().is_stale);
}

#[tokio::test(start_paused = true)]
async fn prefix_invalidation_only_touches_its_domain() {
    let transport = MockTransport::new();
    transport.respond(SYSTEM_HEALTH, system_health_body("JSW", 40.0));
    transport.respond(MACHINE_HEALTH, machine_health_body());
    transport.respond(CURRENT_STATUS, current_status_body());
    let client = client(&transport);

    let system = SystemHealthQuery::new(today());
    let machine = MachineHealthQuery::new(today());
    let status = CurrentStatusQuery::new(CurrentStatusParams::default());
    client.fetch(&system).await.unwrap();
    client.fetch(&machine).await.unwrap();
    client.fetch(&status).await.unwrap();

    let result = client.cache().invalidate_prefix("health-stats", None);
    assert_eq!(result.count, 2);
    assert_eq!(result.patterns, vec!["health-stats:*".to_string()]);

    assert!(client.peek(&system).unwrap().is_stale);
    assert!(client.peek(&machine).unwrap().is_stale);
    assert!(!client.peek(&status).unwrap().is_stale);

    let result = client
        .cache()
        .invalidate_prefix("health-stats", Some("machine-health"));
    assert_eq!(result.count, 1);

    assert_eq!(client.cache().invalidate_all().count, 3);
    assert!(client.peek(&status).unwrap().is_stale);
}

#[tokio::test(start_paused = true)]
async fn invalidation_during_a_request_keeps_the_entry_stale() {
    let transport = MockTransport::new();
    transport.respond(SYSTEM_HEALTH, system_health_body("JSW", 40.0));
    transport.set_delay(Duration::from_secs(1));
    let client = client(&transport);
    let query = SystemHealthQuery::new(today());

    client.read(&query);
    tokio::time::advance(Duration::from_millis(100)).await;
    client.invalidate_query(&query);

    client.fetch(&query).await.unwrap();
    let snapshot = client.peek(&query).unwrap();
    assert!(snapshot.has_value());
    assert!(snapshot.is_stale);

    client.fetch(&query).await.unwrap();
    assert_eq!(transport.calls(SYSTEM_HEALTH), 2);
}

#[tokio::test(start_paused = true)]
async fn invalidation_bumps_the_change_counter() {
    let transport = MockTransport::new();
    transport.respond(SYSTEM_HEALTH, system_health_body("JSW", 40.0));
    let client = client(&transport);
    let query = SystemHealthQuery::new(today());

    let mut changes = client.cache().subscribe_changes();
    client.fetch(&query).await.unwrap();
    assert!(changes.has_changed().unwrap());
    changes.borrow_and_update();

    client.cache().invalidate_prefix("stations", None);
    assert!(!changes.has_changed().unwrap());

    client.invalidate_query(&query);
    assert!(changes.has_changed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn station_refresh_invalidates_station_entries() {
    let transport = MockTransport::new();
    transport.respond(ALL_STATIONS, all_stations_body());
    transport.respond(REFRESH_STATIONS, ack_body());
    transport.respond(SYSTEM_HEALTH, system_health_body("JSW", 40.0));
    let client = client(&transport);

    client.fetch(&AllStationsQuery).await.unwrap();
    client.fetch(&SystemHealthQuery::new(today())).await.unwrap();

    let ack = client.refresh_station_cache().await.unwrap();
    assert!(ack.success);
    assert_eq!(ack.message.as_deref(), Some("ok"));

    assert!(client.peek(&AllStationsQuery).unwrap().is_stale);
    assert!(!client.peek(&SystemHealthQuery::new(today())).unwrap().is_stale);

    let refresh = transport
        .requests()
        .into_iter()
        .find(|r| r.path() == REFRESH_STATIONS)
        .unwrap();
    assert_eq!(refresh.method(), Method::Post);
}

#[tokio::test(start_paused = true)]
async fn failed_mutation_leaves_the_cache_alone() {
    let transport = MockTransport::new();
    transport.respond(CURRENT_STATUS, current_status_body());
    transport.fail(CLEAR_OPERATION_CACHE, DashboardError::from_status(403, "forbidden"));
    let client = client(&transport);
    let status = CurrentStatusQuery::default();

    client.fetch(&status).await.unwrap();

    let err = client.clear_operation_cache().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(!client.peek(&status).unwrap().is_stale);

    transport.respond(CLEAR_OPERATION_CACHE, json!(null));
    client.clear_operation_cache().await.unwrap();
    assert!(client.peek(&status).unwrap().is_stale);
}

#[tokio::test(start_paused = true)]
async fn operation_cache_key_is_sent_in_the_body() {
    let transport = MockTransport::new();
    transport.respond(INVALIDATE_OPERATION_CACHE, ack_body());
    let client = client(&transport);

    client
        .invalidate_operation_cache("current_status:JSW")
        .await
        .unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.path(), INVALIDATE_OPERATION_CACHE);
    assert_eq!(
        request.body(),
        Some(&json!({ "cache_key": "current_status:JSW" }))
    );

    let err = client.invalidate_operation_cache(" ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(transport.total_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_acknowledgement_is_an_error() {
    let transport = MockTransport::new();
    transport.respond(
        REFRESH_STATIONS,
        json!({ "success": false, "error": "metadata store offline" }),
    );
    let client = client(&transport);

    let err = client.refresh_station_cache().await.unwrap_err();
    assert_eq!(err, DashboardError::unknown("metadata store offline"));
}
