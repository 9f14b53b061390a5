//! Collector integration tests
//!
//! Runs the domain collectors and the collection cycle against a mocked
//! Spectrum Control REST API.

use httpmock::prelude::*;
use secrecy::SecretString;
use spectrum_exporter::cache::SnapshotCache;
use spectrum_exporter::collectors::{self, CollectionContext, NameFilter};
use spectrum_exporter::config::{DomainsConfig, SpectrumConfig};
use spectrum_exporter::descriptors::{
    CatalogMetrics, MetricCatalog, MetricDescriptor, PoolCatalog, PropertyDescriptor,
};
use spectrum_exporter::error::ExporterError;
use spectrum_exporter::snapshot::{Domain, DomainData, DomainSnapshot, SwitchResource};
use spectrum_exporter::spectrum::types::Switch;
use spectrum_exporter::spectrum::SpectrumClient;
use std::sync::Arc;

const LOGIN: &str = "/srm/j_security_check";
const STORAGE_SYSTEMS: &str = "/srm/REST/api/v1/StorageSystems";
const STORAGE_PERFORMANCE: &str = "/srm/REST/api/v1/StorageSystems/Performance";
const SWITCHES: &str = "/srm/REST/api/v1/Switches";
const SWITCH_PERFORMANCE: &str = "/srm/REST/api/v1/Switches/Performance";
const POOLS: &str = "/srm/REST/api/v1/Pools";
const SESSION_COOKIE: &str = "JSESSIONID=abc123";

fn client_for(server: &MockServer) -> SpectrumClient {
    SpectrumClient::new(SpectrumConfig {
        base_url: server.base_url(),
        username: "monitor".to_string(),
        password: SecretString::from("secret"),
        verify_ssl: false,
        request_timeout_seconds: 5,
    })
    .expect("Failed to build client")
}

fn descriptor(id: u32, name: &str) -> MetricDescriptor {
    MetricDescriptor {
        metric_id: id,
        prometheus_name: name.to_string(),
        prometheus_help: format!("{} help", name),
    }
}

fn catalog() -> MetricCatalog {
    MetricCatalog {
        metrics: CatalogMetrics {
            storage_systems: vec![descriptor(17, "storage_read_io_rate")],
            switches: vec![descriptor(1000, "switch_port_send_data_rate")],
            pools: PoolCatalog {
                properties: vec![PropertyDescriptor {
                    property_name: "Capacity".to_string(),
                    prometheus_name: "storage_pool_capacity_gib".to_string(),
                    prometheus_help: "Pool capacity in GiB".to_string(),
                }],
            },
        },
    }
}

fn only(domain: Domain) -> DomainsConfig {
    let mut domains = DomainsConfig::default();
    for other in Domain::ALL {
        domains.settings_mut(other).enabled = other == domain;
    }
    domains
}

async fn mock_login(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(LOGIN)
                .body_contains("j_username=monitor")
                .body_contains("j_password=secret");
            then.status(302)
                .header("Set-Cookie", "JSESSIONID=abc123; Path=/srm; Secure; HttpOnly")
                .header("Location", "/srm/");
        })
        .await
}

fn envelope(rows: serde_json::Value) -> serde_json::Value {
    let mut elements = vec![serde_json::json!({"metrics": "descriptor"})];
    if let serde_json::Value::Array(rows) = rows {
        elements.extend(rows);
    }
    serde_json::Value::Array(elements)
}

fn stale_snapshot(domain: Domain) -> DomainSnapshot {
    let data = match domain {
        Domain::Storage => DomainData::Storage(Vec::new()),
        Domain::Switch => DomainData::Switch(vec![SwitchResource {
            switch: Switch {
                name: "OLD_SWITCH".to_string(),
                ..Default::default()
            },
            metrics: Vec::new(),
        }]),
        Domain::Pool => DomainData::Pool(Vec::new()),
    };
    DomainSnapshot {
        data,
        collection_duration_seconds: 1.0,
    }
}

#[tokio::test]
async fn test_storage_uses_newest_present_sample() {
    // Given: A storage system whose newest sample for metric 17 is null
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(STORAGE_SYSTEMS);
            then.status(200).json_body(serde_json::json!([
                {"Name": "SVC01", "id": "1", "Type": "SVC", "Model": "2145-SV1", "Firmware": "8.5.0.0", "IP Address": "10.0.0.1"}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(STORAGE_PERFORMANCE)
                .query_param("ids", "1")
                .query_param("metrics", "17")
                .query_param("granularity", "sample")
                .header("cookie", SESSION_COOKIE);
            then.status(200).json_body(envelope(serde_json::json!([
                {"metricId": 17, "deviceName": "SVC01", "current": [
                    {"x": 1700000000000i64, "y": 42.5},
                    {"x": 1700000060000i64, "y": null}
                ]}
            ])));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/srm/REST/api/v1/StorageSystems/1/Volumes");
            then.status(200).json_body(serde_json::json!([
                {"Volume Unique ID": "6005076801", "id": "11"}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/srm/REST/api/v1/StorageSystems/1/Volumes/Performance");
            then.status(200).json_body(envelope(serde_json::json!([])));
        })
        .await;

    // When: Collecting the storage domain
    let client = client_for(&server);
    let catalog = catalog();
    let ctx = CollectionContext {
        client: &client,
        catalog: &catalog,
    };
    let filter = NameFilter::new(".*").unwrap();
    let resources = collectors::collect_storage(&ctx, &filter)
        .await
        .expect("Storage collection failed");

    // Then: The gauge carries the older, present value and its timestamp
    assert_eq!(resources.len(), 1);
    let metrics = &resources[0].system_metrics;
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].metric_id, 17);
    assert_eq!(metrics[0].value, 42.5);
    assert_eq!(metrics[0].timestamp_ms, 1_700_000_000_000);
    assert_eq!(metrics[0].device_name, "SVC01");
    assert_eq!(
        resources[0].volumes.get("11").map(String::as_str),
        Some("6005076801")
    );
}

#[tokio::test]
async fn test_failed_volume_listing_drops_only_that_storage_system() {
    // Given: Two storage systems, the first of which cannot list its volumes
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(STORAGE_SYSTEMS);
            then.status(200).json_body(serde_json::json!([
                {"Name": "SVC01", "id": "1", "Type": "SVC"},
                {"Name": "SVC02", "id": "2", "Type": "SVC"}
            ]));
        })
        .await;
    for (id, name) in [("1", "SVC01"), ("2", "SVC02")] {
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(STORAGE_PERFORMANCE)
                    .query_param("ids", id);
                then.status(200).json_body(envelope(serde_json::json!([
                    {"metricId": 17, "deviceName": name, "current": [{"x": 1000, "y": 5.0}]}
                ])));
            })
            .await;
    }
    let broken_volumes = server
        .mock_async(|when, then| {
            when.method(GET).path("/srm/REST/api/v1/StorageSystems/1/Volumes");
            then.status(500).body("volume service unavailable");
        })
        .await;
    let skipped_volume_metrics = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/srm/REST/api/v1/StorageSystems/1/Volumes/Performance");
            then.status(200).json_body(envelope(serde_json::json!([])));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/srm/REST/api/v1/StorageSystems/2/Volumes");
            then.status(200).json_body(serde_json::json!([
                {"Volume Unique ID": "6005076802", "id": "21"}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/srm/REST/api/v1/StorageSystems/2/Volumes/Performance")
                .header("cookie", SESSION_COOKIE);
            then.status(200).json_body(envelope(serde_json::json!([
                {"metricId": 17, "deviceName": "vol_db01", "parentDeviceName": "SVC02",
                 "current": [{"x": 2000, "y": 8.5}, {"x": 3000, "y": null}]}
            ])));
        })
        .await;

    // When: Running a storage-only collection cycle
    let client = client_for(&server);
    let cache = SnapshotCache::new();
    collectors::run_collection_cycle(&client, &catalog(), &only(Domain::Storage), &cache)
        .await
        .expect("Storage cycle failed");

    // Then: Only the second system is cached, with system and volume metrics
    let snapshot = cache.get(Domain::Storage).expect("Storage snapshot missing");
    let DomainData::Storage(systems) = &snapshot.data else {
        panic!("Unexpected snapshot payload");
    };
    assert_eq!(systems.len(), 1);
    let system = &systems[0];
    assert_eq!(system.system.name, "SVC02");
    assert_eq!(system.system_metrics.len(), 1);
    assert_eq!(system.system_metrics[0].value, 5.0);
    assert_eq!(system.volume_metrics.len(), 1);
    assert_eq!(system.volume_metrics[0].device_name, "vol_db01");
    assert_eq!(system.volume_metrics[0].parent_device_name, "SVC02");
    assert_eq!(system.volume_metrics[0].value, 8.5);
    assert_eq!(system.volume_metrics[0].timestamp_ms, 2000);
    assert_eq!(
        system.volumes.get("21").map(String::as_str),
        Some("6005076802")
    );
    broken_volumes.assert_hits_async(1).await;
    skipped_volume_metrics.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_pool_with_empty_capacity_is_omitted() {
    // Given: Three pools, one of them without a capacity
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(POOLS);
            then.status(200).json_body(serde_json::json!([
                {"Name": "POOL_A", "Storage System": "SVC01", "Capacity": "1,024.00", "id": "1"},
                {"Name": "POOL_B", "Storage System": "SVC01", "Capacity": "", "id": "2"},
                {"Name": "POOL_C", "Storage System": "SVC02", "Capacity": "2,048.50", "id": "3"}
            ]));
        })
        .await;

    // When: Running a pool-only collection cycle
    let client = client_for(&server);
    let cache = SnapshotCache::new();
    collectors::run_collection_cycle(&client, &catalog(), &only(Domain::Pool), &cache)
        .await
        .expect("Pool cycle failed");

    // Then: Only the two pools with a capacity carry a Capacity value
    let snapshot = cache.get(Domain::Pool).expect("Pool snapshot missing");
    let DomainData::Pool(pools) = &snapshot.data else {
        panic!("Unexpected snapshot payload");
    };
    assert_eq!(pools.len(), 3);

    let capacities: Vec<(&str, &str, f64)> = pools
        .iter()
        .flat_map(|p| {
            p.properties
                .iter()
                .filter(|v| v.property == "Capacity")
                .map(move |v| (p.pool.name.as_str(), p.pool.storage_system.as_str(), v.value))
        })
        .collect();
    assert_eq!(
        capacities,
        vec![("POOL_A", "SVC01", 1024.0), ("POOL_C", "SVC02", 2048.5)]
    );
}

#[tokio::test]
async fn test_rejected_login_keeps_previous_snapshots() {
    // Given: A cache holding earlier snapshots and a login that answers 403
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST).path(LOGIN);
            then.status(403).body("Forbidden");
        })
        .await;

    let cache = SnapshotCache::new();
    for domain in Domain::ALL {
        cache.put(domain, stale_snapshot(domain));
    }
    let before: Vec<_> = Domain::ALL
        .iter()
        .map(|d| cache.get(*d).unwrap())
        .collect();

    // When: Running a full collection cycle
    let client = client_for(&server);
    let result =
        collectors::run_collection_cycle(&client, &catalog(), &DomainsConfig::default(), &cache)
            .await;

    // Then: The cycle fails and every cached snapshot is untouched
    assert!(matches!(result, Err(ExporterError::Collection(_))));
    for (domain, previous) in Domain::ALL.iter().zip(before) {
        let current = cache.get(*domain).unwrap();
        assert!(Arc::ptr_eq(&previous, &current), "{} snapshot replaced", domain);
        assert!(!cache.outcome(*domain).unwrap().success);
    }
    login.assert_hits_async(3).await;
}

#[tokio::test]
async fn test_login_redirect_without_cookie_is_rejected() {
    // Given: A login that bounces back to the login page without a session cookie
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST).path(LOGIN);
            then.status(302).header("Location", "/srm/login.jsp?error=true");
        })
        .await;
    let systems = server
        .mock_async(|when, then| {
            when.method(GET).path(STORAGE_SYSTEMS);
            then.status(200).json_body(serde_json::json!([]));
        })
        .await;

    // When: Authenticating
    let result = client_for(&server).authenticate().await;

    // Then: It is an authentication error and nothing else is requested
    match result {
        Err(ExporterError::Auth(message)) => assert!(message.contains("302"), "{}", message),
        other => panic!("Expected an Auth error, got {:?}", other),
    }
    login.assert_hits_async(1).await;
    systems.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_failed_switch_does_not_drop_others() {
    // Given: Two switches, the first of which fails to report performance
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(SWITCHES);
            then.status(200).json_body(serde_json::json!([
                {"Name": "FAB_A_SW1", "id": "100"},
                {"Name": "FAB_A_SW2", "id": "200"}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(SWITCH_PERFORMANCE)
                .query_param("ids", "100");
            then.status(500).body("internal error");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(SWITCH_PERFORMANCE)
                .query_param("ids", "200");
            then.status(200).json_body(envelope(serde_json::json!([
                {"metricId": 1000, "deviceName": "FAB_A_SW2 ", "current": [{"x": 10, "y": 3.0}]}
            ])));
        })
        .await;

    // When: Collecting the switch domain
    let client = client_for(&server);
    let cache = SnapshotCache::new();
    collectors::run_collection_cycle(&client, &catalog(), &only(Domain::Switch), &cache)
        .await
        .expect("Switch cycle failed");

    // Then: The healthy switch is still in the snapshot
    let snapshot = cache.get(Domain::Switch).unwrap();
    let DomainData::Switch(switches) = &snapshot.data else {
        panic!("Unexpected snapshot payload");
    };
    assert_eq!(switches.len(), 1);
    assert_eq!(switches[0].switch.name, "FAB_A_SW2");
    assert_eq!(switches[0].metrics[0].device_name, "FAB_A_SW2");
    assert_eq!(switches[0].metrics[0].value, 3.0);
}

#[tokio::test]
async fn test_filtered_out_switches_are_not_queried() {
    // Given: A filter that only selects fabric B switches
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(SWITCHES);
            then.status(200).json_body(serde_json::json!([
                {"Name": "fab_a_sw1", "id": "100"},
                {"Name": "fab_b_sw1", "id": "300"}
            ]));
        })
        .await;
    let excluded = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(SWITCH_PERFORMANCE)
                .query_param("ids", "100");
            then.status(200).json_body(envelope(serde_json::json!([])));
        })
        .await;
    let included = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(SWITCH_PERFORMANCE)
                .query_param("ids", "300");
            then.status(200).json_body(envelope(serde_json::json!([])));
        })
        .await;

    // When: Collecting switches with the filter
    let client = client_for(&server);
    let catalog = catalog();
    let ctx = CollectionContext {
        client: &client,
        catalog: &catalog,
    };
    let filter = NameFilter::new("FAB_B").unwrap();
    let switches = collectors::collect_switches(&ctx, &filter).await.unwrap();

    // Then: Only the matching switch was fetched
    assert_eq!(switches.len(), 1);
    assert_eq!(switches[0].switch.name, "fab_b_sw1");
    excluded.assert_hits_async(0).await;
    included.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_invalid_filter_fails_the_domain() {
    // Given: A pool domain configured with a broken pattern
    let server = MockServer::start_async().await;
    let login = mock_login(&server).await;
    let mut domains = only(Domain::Pool);
    domains.pool.filter = "([unclosed".to_string();

    // When: Running the cycle
    let client = client_for(&server);
    let cache = SnapshotCache::new();
    let result = collectors::run_collection_cycle(&client, &catalog(), &domains, &cache).await;

    // Then: The domain fails before any request and nothing is cached
    assert!(result.is_err());
    assert!(!cache.contains(Domain::Pool));
    assert_eq!(cache.outcome(Domain::Pool).map(|o| o.success), Some(false));
    login.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_malformed_envelope_is_a_decode_error() {
    // Given: A switch performance response whose data row lacks a metric id
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(SWITCH_PERFORMANCE);
            then.status(200)
                .json_body(serde_json::json!([{"meta": true}, {"deviceName": "SW1"}]));
        })
        .await;

    // When: Fetching switch performance directly
    let client = client_for(&server);
    let session = client.authenticate().await.expect("Login failed");
    let query = spectrum_exporter::spectrum::PerformanceQuery::since(
        std::time::Duration::from_secs(60),
        [1000],
    );
    let result = client.switch_performance(&session, &query, "1").await;

    // Then: The response is reported as a decode error
    assert!(matches!(result, Err(ExporterError::Decode { .. })));
}

#[tokio::test]
async fn test_listing_failure_reports_status() {
    // Given: A pool listing that answers 404
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(POOLS);
            then.status(404).body("not found");
        })
        .await;

    // When: Listing pools
    let client = client_for(&server);
    let session = client.authenticate().await.unwrap();
    let result = client.list_pools(&session).await;

    // Then: Status and body are preserved in the error
    match result {
        Err(ExporterError::Request { status, body }) => {
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
        }
        other => panic!("Expected request error, got {:?}", other.map(|p| p.len())),
    }
}
