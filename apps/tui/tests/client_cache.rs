use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agrivision::api::{ApiClient, ApiError};
use agrivision::config::ApiConfig;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Hits {
    region: Arc<AtomicUsize>,
    top: Arc<AtomicUsize>,
    geojson: Arc<AtomicUsize>,
}

async fn region(State(hits): State<Hits>, Path(id): Path<i64>) -> Result<Json<Value>, StatusCode> {
    hits.region.fetch_add(1, Ordering::SeqCst);
    if id == 99 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({
        "id": id,
        "nom": "Centre",
        "code_region": "CE",
        "chef_lieu": "Yaoundé",
        "population": 4_100_000
    })))
}

async fn top_regions(State(hits): State<Hits>) -> Json<Value> {
    hits.top.fetch_add(1, Ordering::SeqCst);
    Json(json!([
        {"region_id": 2, "nom": "Centre", "total_quantite": 1200.5},
        {"region_id": 1, "nom": "Adamaoua", "total_quantite": 300.0}
    ]))
}

async fn regions_geojson(State(hits): State<Hits>) -> Json<Value> {
    hits.geojson.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"id": 2, "nom": "Centre"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[11.0, 4.0], [12.0, 4.0], [12.0, 5.0], [11.0, 5.0], [11.0, 4.0]]]
            }
        }]
    }))
}

async fn slow_stats() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({}))
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn start() -> (ApiClient, Hits) {
    let hits = Hits::default();
    let router = Router::new()
        .route("/api/v1/regions/{id}", get(region))
        .route("/api/v1/statistiques/top-regions", get(top_regions))
        .route("/api/v1/geojson/regions", get(regions_geojson))
        .route("/api/v1/statistiques/globales", get(slow_stats))
        .with_state(hits.clone());
    let addr = serve(router).await;

    let config = ApiConfig {
        base_url: format!("http://{addr}"),
        timeout: Duration::from_millis(300),
        ..ApiConfig::default()
    };
    (ApiClient::new(&config).unwrap(), hits)
}

#[tokio::test]
async fn reference_data_is_fetched_once() {
    let (client, hits) = start().await;

    let first = client.region(2).await.unwrap();
    let second = client.region(2).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.name, "Centre");
    assert_eq!(first.capital.as_deref(), Some("Yaoundé"));
    assert_eq!(hits.region.load(Ordering::SeqCst), 1);

    let stats = client.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);
}

#[tokio::test]
async fn statistics_bypass_the_cache() {
    let (client, hits) = start().await;

    let top = client.top_regions(None, None, 10).await.unwrap();
    client.top_regions(None, None, 10).await.unwrap();

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].label(), "Centre");
    assert_eq!(hits.top.load(Ordering::SeqCst), 2);
    assert_eq!(client.cache_stats().entries, 0);
}

#[tokio::test]
async fn clearing_the_cache_forces_a_refetch() {
    let (client, hits) = start().await;

    client.regions_geojson().await.unwrap();
    client.clear_cache();
    let collection = client.regions_geojson().await.unwrap();

    assert_eq!(collection.len(), 1);
    assert_eq!(collection.features[0].id(), Some(2));
    assert_eq!(collection.features[0].name(), "Centre");
    assert_eq!(hits.geojson.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn missing_entity_reports_not_found() {
    let (client, hits) = start().await;

    let err = client.region(99).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    // Failures are not cached.
    client.region(99).await.unwrap_err();
    assert_eq!(hits.region.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn slow_server_times_out() {
    let (client, _hits) = start().await;

    let err = client.global_stats().await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout { .. }), "got {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let config = ApiConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout: Duration::from_millis(300),
        ..ApiConfig::default()
    };
    let client = ApiClient::new(&config).unwrap();

    let err = client.region(1).await.unwrap_err();
    assert!(
        matches!(err, ApiError::Network { .. } | ApiError::Timeout { .. }),
        "got {err:?}"
    );
}
