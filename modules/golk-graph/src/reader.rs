use golk_common::Month;
use neo4rs::query;
use serde::Serialize;

use crate::GraphClient;

/// One row of `/weather/{month}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherRecord {
    pub month: String,
    pub description: Option<String>,
    pub season: Option<String>,
    pub average_temperature: Option<f64>,
    pub average_precipitation: Option<f64>,
    pub precipitation_probability: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateStats {
    pub total_areas: i64,
    pub areas_with_weather: i64,
    pub oldest_update: Option<String>,
    pub newest_update: Option<String>,
}

const WEATHER_RETURN: &str = "RETURN w.Month AS month,
           w.Description AS description,
           w.Season AS season,
           w.avg_temp AS avg_temp,
           w.avg_precip AS avg_precip,
           coalesce(w.precipitation_prob, w.precip_prob) AS precip_prob";

/// Read side of the weather data.
pub struct WeatherReader {
    client: GraphClient,
}

impl WeatherReader {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn weather_for_month(&self, month: Month) -> Result<Vec<WeatherRecord>, neo4rs::Error> {
        let q = query(&format!("MATCH (w:Weather {{Month: $month}})\n{WEATHER_RETURN}"))
            .param("month", month.name());
        self.fetch(q).await
    }

    /// All Weather nodes, January first. Nodes with an unrecognised month sort last.
    pub async fn weather_all_months(&self) -> Result<Vec<WeatherRecord>, neo4rs::Error> {
        let q = query(&format!("MATCH (w:Weather)\n{WEATHER_RETURN}"));
        let mut records = self.fetch(q).await?;
        sort_by_calendar(&mut records);
        Ok(records)
    }

    pub async fn update_stats(&self) -> Result<UpdateStats, neo4rs::Error> {
        let q = query(
            "MATCH (a:Area)
             WITH count(a) AS total_areas
             OPTIONAL MATCH (b:Area)-[:HAS_WEATHER]->(:Weather)
             RETURN total_areas,
                    count(DISTINCT b) AS areas_with_weather,
                    min(b.last_weather_update) AS oldest_update,
                    max(b.last_weather_update) AS newest_update",
        );

        let mut stream = self.client.graph.execute(q).await?;
        match stream.next().await? {
            Some(row) => Ok(UpdateStats {
                total_areas: row.get("total_areas").unwrap_or(0),
                areas_with_weather: row.get("areas_with_weather").unwrap_or(0),
                oldest_update: row.get("oldest_update").ok(),
                newest_update: row.get("newest_update").ok(),
            }),
            None => Ok(UpdateStats::default()),
        }
    }

    async fn fetch(&self, q: neo4rs::Query) -> Result<Vec<WeatherRecord>, neo4rs::Error> {
        let mut stream = self.client.graph.execute(q).await?;
        let mut records = Vec::new();
        while let Some(row) = stream.next().await? {
            records.push(WeatherRecord {
                month: row.get("month").unwrap_or_default(),
                description: row.get("description").ok(),
                season: row.get("season").ok(),
                average_temperature: row.get("avg_temp").ok(),
                average_precipitation: row.get("avg_precip").ok(),
                precipitation_probability: row.get("precip_prob").ok(),
            });
        }
        Ok(records)
    }
}

fn sort_by_calendar(records: &mut [WeatherRecord]) {
    records.sort_by_key(|r| {
        r.month
            .parse::<Month>()
            .map(Month::number)
            .unwrap_or(u32::MAX)
    });
}
