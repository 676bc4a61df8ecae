//! Integration tests for the weather read/write paths and the read-only query runner.
//!
//! Requirements: Docker (for Neo4j via testcontainers)
//!
//! Run with: cargo test -p golk-graph --features test-utils --test weather_graph_test

#![cfg(feature = "test-utils")]

use chrono::{Duration, Utc};
use golk_common::{CurrentConditions, Month, MonthlyWeather, RESET_TIMESTAMP};
use golk_graph::{migrate, query, GraphClient, QueryRunner, WeatherReader, WeatherWriter};

async fn setup() -> (impl std::any::Any, GraphClient) {
    let (container, client) = golk_graph::testutil::neo4j_container().await;
    migrate(&client).await.expect("migrate failed");
    (container, client)
}

async fn create_area(client: &GraphClient, name: &str) {
    client
        .inner()
        .run(query("CREATE (:Area {Areas: $name})").param("name", name))
        .await
        .expect("Failed to create area");
}

fn sample(month: Month, avg_temp: f64) -> MonthlyWeather {
    MonthlyWeather {
        month,
        season: month.season(),
        description: "Warm and Sunny".into(),
        avg_temp,
        avg_precip: 120.0,
        avg_wind: 14.0,
        precip_prob: 25.0,
        current: None,
    }
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let (_c, client) = setup().await;
    migrate(&client).await.expect("second migrate should succeed");
}

#[tokio::test]
async fn written_months_are_read_back_in_calendar_order() {
    let (_c, client) = setup().await;
    create_area(&client, "Kandy").await;

    let writer = WeatherWriter::new(client.clone());
    let reader = WeatherReader::new(client.clone());
    let now = Utc::now();

    writer
        .write_month("Kandy", &sample(Month::March, 27.5), now)
        .await
        .unwrap();
    let mut january = sample(Month::January, 24.0);
    january.overlay_current(CurrentConditions {
        temp: 25.0,
        max_temp: 29.0,
        min_temp: 19.0,
        precipitation: 0.0,
        precipitation_prob: 10.0,
        wind_speed: 8.0,
        description: "Pleasant".into(),
    });
    writer.write_month("Kandy", &january, now).await.unwrap();

    let all = reader.weather_all_months().await.unwrap();
    let months: Vec<_> = all.iter().map(|r| r.month.as_str()).collect();
    assert_eq!(months, ["January", "March"]);
    assert_eq!(all[0].description.as_deref(), Some("Pleasant"));
    assert_eq!(all[0].precipitation_probability, Some(10.0));
    assert_eq!(all[1].average_temperature, Some(27.5));

    let march = reader.weather_for_month(Month::March).await.unwrap();
    assert_eq!(march.len(), 1);
    assert_eq!(march[0].season.as_deref(), Some("First Inter-monsoon"));

    let stats = reader.update_stats().await.unwrap();
    assert_eq!(stats.total_areas, 1);
    assert_eq!(stats.areas_with_weather, 1);
    assert!(stats.newest_update.is_some());
}

#[tokio::test]
async fn area_states_reflect_updates_and_resets() {
    let (_c, client) = setup().await;
    create_area(&client, "Galle").await;
    create_area(&client, "Ella").await;

    let writer = WeatherWriter::new(client.clone());
    let stamp = Utc::now() - Duration::hours(1);
    writer
        .write_month("Galle", &sample(Month::July, 28.0), stamp)
        .await
        .unwrap();

    let states = writer.area_weather_states().await.unwrap();
    let galle = states.iter().find(|s| s.area == "Galle").unwrap();
    let ella = states.iter().find(|s| s.area == "Ella").unwrap();
    assert!(galle.last_updated.is_some());
    assert!(ella.last_updated.is_none());

    let counts = writer.reset_update_timestamps().await.unwrap();
    assert_eq!(counts.areas, 2);
    assert_eq!(counts.weather_nodes, 1);

    let states = writer.area_weather_states().await.unwrap();
    for s in states {
        assert_eq!(
            s.last_updated.map(golk_common::format_timestamp).as_deref(),
            Some(RESET_TIMESTAMP)
        );
    }
}

#[tokio::test]
async fn ensure_month_marks_pending_and_link_requires_area() {
    let (_c, client) = setup().await;
    create_area(&client, "Jaffna").await;
    let writer = WeatherWriter::new(client.clone());

    writer.ensure_month(Month::October).await.unwrap();
    writer.ensure_month(Month::October).await.unwrap();

    assert!(writer.link_area_month("Jaffna", Month::October).await.unwrap());
    assert!(!writer.link_area_month("Atlantis", Month::October).await.unwrap());

    let reader = WeatherReader::new(client.clone());
    let october = reader.weather_for_month(Month::October).await.unwrap();
    assert_eq!(october.len(), 1);
    assert_eq!(october[0].description.as_deref(), Some("Pending Update"));
}

#[tokio::test]
async fn run_read_caps_rows_and_returns_json() {
    let (_c, client) = setup().await;
    for name in ["A", "B", "C", "D"] {
        create_area(&client, name).await;
    }

    let runner = QueryRunner::new(client.clone());
    let rows = runner
        .run_read("MATCH (a:Area) RETURN a.Areas AS area ORDER BY area", 3)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["area"], "A");
}

#[tokio::test]
async fn run_read_never_commits() {
    let (_c, client) = setup().await;
    let runner = QueryRunner::new(client.clone());
    runner
        .run_read("CREATE (a:Area {Areas: 'Ghost'}) RETURN a.Areas AS area", 10)
        .await
        .unwrap();

    let rows = runner
        .run_read("MATCH (a:Area {Areas: 'Ghost'}) RETURN count(a) AS n", 10)
        .await
        .unwrap();
    assert_eq!(rows[0]["n"], 0);
}

#[tokio::test]
async fn run_read_keeps_return_column_order() {
    let (_c, client) = setup().await;
    create_area(&client, "Kandy").await;
    let runner = QueryRunner::new(client.clone());
    let rows = runner
        .run_read("MATCH (a:Area) RETURN a.Areas AS zone, 1 AS alpha", 10)
        .await
        .unwrap();
    let keys: Vec<&String> = rows[0].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["zone", "alpha"]);
}
