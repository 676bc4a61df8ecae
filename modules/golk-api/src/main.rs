use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ai_client::OpenAi;
use golk_api::chat::examples::ExampleBank;
use golk_api::chat::ChatPipeline;
use golk_api::sessions::SessionStore;
use golk_api::{router, AppState, WeatherServices};
use golk_common::Config;
use golk_graph::{GraphClient, QueryRunner, WeatherReader};
use golk_weather::{GraphWeatherStore, OpenMeteoClient, WeatherScheduler, WeatherUpdater};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("golk=info".parse()?))
        .init();

    let config = Config::from_env()?;

    let client = GraphClient::connect(
        &config.neo4j_uri,
        &config.neo4j_user,
        &config.neo4j_password,
        config.neo4j_database.as_deref(),
    )
    .await?;

    let mut model = OpenAi::new(&config.openai_api_key, &config.deployment_name);
    if let Some(url) = &config.openai_base_url {
        model = model.with_base_url(url);
    }

    let examples = match ExampleBank::load(&config.query_examples_path) {
        Ok(bank) => {
            info!(count = bank.len(), "Loaded query examples");
            bank
        }
        Err(e) => {
            warn!(
                error = %e,
                path = %config.query_examples_path.display(),
                "Failed to load query examples, continuing without them"
            );
            ExampleBank::default()
        }
    };

    let pipeline = ChatPipeline::new(
        Arc::new(model),
        Arc::new(QueryRunner::new(client.clone())),
        examples,
    );

    let updater = Arc::new(WeatherUpdater::new(
        Arc::new(OpenMeteoClient::new()?),
        Arc::new(GraphWeatherStore::new(client.clone())),
        config.coordinates_csv.clone(),
        config.weather_batch_size,
        config.weather_update_interval_hours,
    ));
    let scheduler = Arc::new(WeatherScheduler::new(
        updater.clone(),
        config.scheduler_interval_minutes,
    ));
    if config.weather_scheduler_enabled {
        scheduler.start();
    } else {
        info!("Weather scheduler disabled");
    }

    let state = Arc::new(AppState {
        sessions: SessionStore::new(),
        pipeline,
        weather: Some(WeatherServices {
            lookup: Arc::new(WeatherReader::new(client)),
            updater,
            scheduler: scheduler.clone(),
        }),
    });

    let app = router(state);

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("GoLK API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    scheduler.stop();
    Ok(())
}
