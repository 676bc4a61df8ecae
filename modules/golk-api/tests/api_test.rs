//! HTTP-level tests against the router with a scripted model and in-memory graph.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use ai_client::{ChatModel, CompletionRequest};
use golk_api::chat::examples::{ExampleBank, QueryExample};
use golk_api::chat::{ChatPipeline, QueryExecutor};
use golk_api::rest::weather::WeatherLookup;
use golk_api::sessions::SessionStore;
use golk_api::{router, AppState, WeatherServices};
use golk_common::{CurrentConditions, Month, MonthSelector, MonthlyWeather};
use golk_graph::{AreaWeatherState, ResetCounts, UpdateStats, WeatherRecord};
use golk_weather::{WeatherScheduler, WeatherSource, WeatherStore, WeatherUpdater};

// --- Fakes ---

struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("model unavailable"))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct FakeGraph {
    rows: Vec<Value>,
    executed: Mutex<Vec<String>>,
}

#[async_trait]
impl QueryExecutor for FakeGraph {
    async fn run_read(&self, cypher: &str, max_rows: usize) -> Result<Vec<Value>> {
        self.executed.lock().unwrap().push(cypher.to_string());
        Ok(self.rows.iter().take(max_rows).cloned().collect())
    }
}

struct FakeLookup;

#[async_trait]
impl WeatherLookup for FakeLookup {
    async fn weather(&self, selector: MonthSelector) -> Result<Vec<WeatherRecord>> {
        let record = |m: Month| WeatherRecord {
            month: m.name().to_string(),
            description: Some("Warm and humid".into()),
            season: Some("Southwest Monsoon".into()),
            average_temperature: Some(27.4),
            average_precipitation: Some(3.1),
            precipitation_probability: Some(62.0),
        };
        Ok(match selector {
            MonthSelector::Month(Month::February) => Vec::new(),
            MonthSelector::Month(m) => vec![record(m)],
            MonthSelector::All => vec![record(Month::January), record(Month::July)],
        })
    }
}

struct NoSource;

#[async_trait]
impl WeatherSource for NoSource {
    async fn current_conditions(&self, _: f64, _: f64, _: u32) -> Result<CurrentConditions> {
        anyhow::bail!("offline")
    }

    async fn monthly_climate(
        &self,
        _: f64,
        _: f64,
        _: NaiveDate,
    ) -> Result<BTreeMap<Month, MonthlyWeather>> {
        anyhow::bail!("offline")
    }
}

struct EmptyStore;

#[async_trait]
impl WeatherStore for EmptyStore {
    async fn area_weather_states(&self) -> Result<Vec<AreaWeatherState>> {
        Ok(Vec::new())
    }
    async fn write_month(&self, _: &str, _: &MonthlyWeather, _: DateTime<Utc>) -> Result<()> {
        Ok(())
    }
    async fn ensure_month(&self, _: Month) -> Result<()> {
        Ok(())
    }
    async fn link_area_month(&self, _: &str, _: Month) -> Result<bool> {
        Ok(false)
    }
    async fn reset_update_timestamps(&self) -> Result<ResetCounts> {
        Ok(ResetCounts::default())
    }
    async fn update_stats(&self) -> Result<UpdateStats> {
        Ok(UpdateStats::default())
    }
}

// --- Helpers ---

const KANDY_REPLY: &str = r#"{"cypher_query": "MATCH (a:Area {Areas: 'Kandy'})-[:HAS_ACCOMMODATION]->(h:Accommodation) RETURN h.Accommodation_Place_Name AS hotel, h.Rating AS rating", "text_explanation": "Hotels in Kandy."}"#;

struct Harness {
    app: Router,
    model: Arc<ScriptedModel>,
    graph: Arc<FakeGraph>,
}

fn harness(replies: &[&str], rows: Vec<Value>, with_weather: bool) -> Harness {
    let model = Arc::new(ScriptedModel::new(replies));
    let graph = Arc::new(FakeGraph {
        rows,
        ..Default::default()
    });
    let examples = ExampleBank::new(vec![QueryExample {
        question: "Show me hotels in Galle".into(),
        cypher_query: "MATCH (a:Area {Areas: 'Galle'})-[:HAS_ACCOMMODATION]->(h) RETURN h.Accommodation_Place_Name".into(),
    }]);

    let weather = with_weather.then(|| {
        let updater = Arc::new(WeatherUpdater::new(
            Arc::new(NoSource),
            Arc::new(EmptyStore),
            "does-not-exist.csv",
            58,
            2.0,
        ));
        WeatherServices {
            lookup: Arc::new(FakeLookup),
            scheduler: Arc::new(WeatherScheduler::new(updater.clone(), 2)),
            updater,
        }
    });

    let state = Arc::new(AppState {
        sessions: SessionStore::new(),
        pipeline: ChatPipeline::new(model.clone(), graph.clone(), examples),
        weather,
    });
    Harness {
        app: router(state),
        model,
        graph,
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn new_session(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/api/start_session", None).await;
    assert_eq!(status, StatusCode::OK);
    body["session_id"].as_str().unwrap().to_string()
}

// --- Chat ---

#[tokio::test]
async fn chat_round_trip_records_history() {
    let h = harness(
        &[KANDY_REPLY, "Earl's Regency is the best rated."],
        vec![
            json!({"hotel": "Earl's Regency", "rating": 4.6}),
            json!({"hotel": "Amaya Hills", "rating": 4.4}),
        ],
        false,
    );
    let id = new_session(&h.app).await;

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/chat",
        Some(json!({
            "question": "Where should I stay in Kandy?",
            "session_id": id,
            "settings": {
                "language": "English",
                "politeness_level": "Friendly",
                "formality": "Casual",
                "creativity": 0.2,
                "response_length": "Short"
            }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], id);
    assert_eq!(body["question_count"], 1);
    let result = &body["result"];
    assert_eq!(result["text_explanation"], "Hotels in Kandy.");
    assert_eq!(result["data"].as_array().unwrap().len(), 2);
    assert!(result["table_html"]
        .as_str()
        .unwrap()
        .contains("<td>Earl&#x27;s Regency</td>"));
    assert_eq!(result["table_insights"], "Earl's Regency is the best rated.");
    assert!(result["query_error"].is_null());
    assert_eq!(h.model.requests.lock().unwrap()[0].temperature, Some(0.2));

    let (status, history) = send(&h.app, Method::GET, &format!("/api/history/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["questions"], json!(["Where should I stay in Kandy?"]));
    assert_eq!(history["answers"], json!(["Hotels in Kandy."]));
}

#[tokio::test]
async fn earlier_turns_are_sent_to_the_model() {
    let h = harness(
        &[
            r#"{"cypher_query": null, "text_explanation": "Ayubowan!"}"#,
            r#"{"cypher_query": null, "text_explanation": "Try Mirissa."}"#,
        ],
        Vec::new(),
        false,
    );
    let id = new_session(&h.app).await;
    for question in ["Hello", "Any beaches?"] {
        let (status, _) = send(
            &h.app,
            Method::POST,
            "/api/chat",
            Some(json!({"question": question, "session_id": id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let requests = h.model.requests.lock().unwrap();
    let second: Vec<&str> = requests[1]
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(&second[1..], ["Hello", "Ayubowan!", "Any beaches?"]);
}

#[tokio::test]
async fn unknown_session_is_rejected() {
    let h = harness(&[KANDY_REPLY], Vec::new(), false);
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/chat",
        Some(json!({"question": "Hi", "session_id": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid session ID");
    assert!(h.model.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn destructive_query_is_reported_and_not_run() {
    let h = harness(
        &[r#"{"cypher_query": "MATCH (n) DETACH DELETE n", "text_explanation": "Cleared."}"#],
        vec![json!({"x": 1})],
        false,
    );
    let id = new_session(&h.app).await;
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/chat",
        Some(json!({"question": "delete everything", "session_id": id})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["result"]["query_error"]
        .as_str()
        .unwrap()
        .contains("DETACH"));
    assert!(body["result"]["table_html"].is_null());
    assert!(h.graph.executed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn model_outage_is_a_bad_gateway() {
    let h = harness(&[], Vec::new(), false);
    let id = new_session(&h.app).await;
    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/chat",
        Some(json!({"question": "Hi", "session_id": id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

// --- Sessions ---

#[tokio::test]
async fn session_lifecycle() {
    let h = harness(&[], Vec::new(), false);
    let id = new_session(&h.app).await;

    let (_, check) = send(&h.app, Method::GET, &format!("/chatbot/check_session/{id}"), None).await;
    assert_eq!(check["valid"], true);

    let (status, _) = send(&h.app, Method::GET, &format!("/chatbot/chat_history/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&h.app, Method::DELETE, &format!("/api/session/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&h.app, Method::DELETE, &format!("/api/session/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&h.app, Method::GET, &format!("/api/history/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, check) = send(&h.app, Method::GET, &format!("/chatbot/check_session/{id}"), None).await;
    assert_eq!(check["valid"], false);
}

#[tokio::test]
async fn root_and_health() {
    let h = harness(&[], Vec::new(), false);
    let (status, _) = send(&h.app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, health) = send(&h.app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["examples"], 1);
}

// --- Weather ---

#[tokio::test]
async fn weather_by_month_and_all() {
    let h = harness(&[], Vec::new(), true);

    let (status, body) = send(&h.app, Method::GET, "/weather/july", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["month"], "July");
    assert_eq!(body[0]["average_temperature"], 27.4);

    let (status, body) = send(&h.app, Method::GET, "/weather/all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = send(&h.app, Method::GET, "/weather/February", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&h.app, Method::GET, "/weather/Smarch", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn month_update_is_acknowledged_immediately() {
    let h = harness(&[], Vec::new(), true);
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/weather/update/month/March?areas=Kandy,%20Ella",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["month"], "March");
    assert_eq!(body["areas"], json!(["Kandy", "Ella"]));
}

#[tokio::test]
async fn scheduler_status_and_refresh() {
    let h = harness(&[], Vec::new(), true);
    let (status, body) = send(&h.app, Method::GET, "/weather/scheduler/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["running"], false);
    assert_eq!(body["batch_size"], 58);
    assert_eq!(body["scheduler_interval_minutes"], 2);

    let (status, _) = send(&h.app, Method::POST, "/weather/scheduler/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn weather_routes_without_services_are_unavailable() {
    let h = harness(&[], Vec::new(), false);
    let (status, _) = send(&h.app, Method::GET, "/weather/july", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
