use chrono::{DateTime, Utc};
use golk_common::{format_timestamp, parse_timestamp, Month, MonthlyWeather, RESET_TIMESTAMP};
use neo4rs::query;
use tracing::info;

use crate::GraphClient;

/// What the updater needs to know about an area before refreshing it.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaWeatherState {
    pub area: String,
    /// `None` when the area was never refreshed.
    pub last_updated: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetCounts {
    pub areas: i64,
    pub weather_nodes: i64,
}

/// Cypher for one (area, month) write. Real-time fields are set only when present.
fn write_month_cypher(has_current: bool) -> String {
    let mut cypher = String::from(
        "MERGE (w:Weather {Month: $month})
         SET w.Season = $season,
             w.Description = $description,
             w.avg_temp = $avg_temp,
             w.avg_precip = $avg_precip,
             w.avg_wind = $avg_wind,
             w.precip_prob = $precip_prob,
             w.last_updated = $last_updated",
    );
    if has_current {
        cypher.push_str(
            ",
             w.current_temp = $current_temp,
             w.max_temp = $max_temp,
             w.min_temp = $min_temp,
             w.precipitation = $precipitation,
             w.precipitation_prob = $precipitation_prob,
             w.wind_speed = $wind_speed",
        );
    }
    cypher.push_str(
        "
         WITH w
         MATCH (a:Area {Areas: $area})
         MERGE (a)-[r:HAS_WEATHER]->(w)
         SET r.avg_temp = $avg_temp,
             r.avg_precip = $avg_precip,
             r.avg_wind = $avg_wind,
             r.precip_prob = $precip_prob,
             r.description = $description,
             a.last_weather_update = $last_updated",
    );
    cypher
}

/// Write side of the weather data.
pub struct WeatherWriter {
    client: GraphClient,
}

impl WeatherWriter {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn area_weather_states(&self) -> Result<Vec<AreaWeatherState>, neo4rs::Error> {
        let q = query(
            "MATCH (a:Area)
             RETURN a.Areas AS area,
                    a.last_weather_update AS last_updated,
                    a.Latitude AS latitude,
                    a.Longitude AS longitude",
        );

        let mut stream = self.client.graph.execute(q).await?;
        let mut states = Vec::new();
        while let Some(row) = stream.next().await? {
            let area: String = row.get("area").unwrap_or_default();
            if area.is_empty() {
                continue;
            }
            let last_updated = row
                .get::<String>("last_updated")
                .ok()
                .and_then(|raw| parse_timestamp(&raw));
            states.push(AreaWeatherState {
                area,
                last_updated,
                latitude: row.get("latitude").ok(),
                longitude: row.get("longitude").ok(),
            });
        }
        Ok(states)
    }

    pub async fn write_month(
        &self,
        area: &str,
        weather: &MonthlyWeather,
        last_updated: DateTime<Utc>,
    ) -> Result<(), neo4rs::Error> {
        let mut q = query(&write_month_cypher(weather.current.is_some()))
            .param("month", weather.month.name())
            .param("season", weather.season.name())
            .param("description", weather.description.as_str())
            .param("avg_temp", weather.avg_temp)
            .param("avg_precip", weather.avg_precip)
            .param("avg_wind", weather.avg_wind)
            .param("precip_prob", weather.precip_prob)
            .param("last_updated", format_timestamp(last_updated))
            .param("area", area);

        if let Some(ref c) = weather.current {
            q = q
                .param("current_temp", c.temp)
                .param("max_temp", c.max_temp)
                .param("min_temp", c.min_temp)
                .param("precipitation", c.precipitation)
                .param("precipitation_prob", c.precipitation_prob)
                .param("wind_speed", c.wind_speed);
        }

        self.client.graph.run(q).await
    }

    /// Create the month's Weather node if missing, marked as pending.
    pub async fn ensure_month(&self, month: Month) -> Result<(), neo4rs::Error> {
        let q = query(
            "MERGE (w:Weather {Month: $month})
             ON CREATE SET w.Description = 'Pending Update', w.Season = $season",
        )
        .param("month", month.name())
        .param("season", month.season().name());
        self.client.graph.run(q).await
    }

    /// Returns false when the area does not exist.
    pub async fn link_area_month(&self, area: &str, month: Month) -> Result<bool, neo4rs::Error> {
        let q = query(
            "MATCH (a:Area {Areas: $area})
             MATCH (w:Weather {Month: $month})
             MERGE (a)-[:HAS_WEATHER]->(w)
             RETURN count(a) AS linked",
        )
        .param("area", area)
        .param("month", month.name());

        let mut stream = self.client.graph.execute(q).await?;
        match stream.next().await? {
            Some(row) => Ok(row.get::<i64>("linked").unwrap_or(0) > 0),
            None => Ok(false),
        }
    }

    /// Stamp every area and Weather node with the reset marker so the next batch sees them as stale.
    pub async fn reset_update_timestamps(&self) -> Result<ResetCounts, neo4rs::Error> {
        let areas = self
            .count_query(
                "MATCH (a:Area) SET a.last_weather_update = $ts RETURN count(a) AS n",
            )
            .await?;
        let weather_nodes = self
            .count_query("MATCH (w:Weather) SET w.last_updated = $ts RETURN count(w) AS n")
            .await?;

        info!(areas, weather_nodes, "Reset weather update timestamps");
        Ok(ResetCounts {
            areas,
            weather_nodes,
        })
    }

    async fn count_query(&self, cypher: &str) -> Result<i64, neo4rs::Error> {
        let q = query(cypher).param("ts", RESET_TIMESTAMP);
        let mut stream = self.client.graph.execute(q).await?;
        match stream.next().await? {
            Some(row) => Ok(row.get::<i64>("n").unwrap_or(0)),
            None => Ok(0),
        }
    }
}
