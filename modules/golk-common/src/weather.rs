use serde::{Deserialize, Serialize};

use crate::types::{Month, Season};

pub const NO_DATA_DESCRIPTION: &str = "No data available";

/// Classify conditions into a short human label. Thresholds are strict.
pub fn describe_weather(temp_c: f64, precip_prob_pct: f64, wind_kmh: f64) -> &'static str {
    if precip_prob_pct > 70.0 {
        if temp_c < 22.0 {
            "Cool and Rainy"
        } else {
            "Warm and Rainy"
        }
    } else if precip_prob_pct > 30.0 {
        "Partly Cloudy with Chance of Rain"
    } else if wind_kmh > 20.0 {
        "Windy"
    } else if temp_c > 30.0 {
        "Hot and Sunny"
    } else if temp_c > 25.0 {
        "Warm and Sunny"
    } else {
        "Pleasant"
    }
}

/// Real-time readings for the current hour and day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp: f64,
    pub max_temp: f64,
    pub min_temp: f64,
    pub precipitation: f64,
    pub precipitation_prob: f64,
    pub wind_speed: f64,
    pub description: String,
}

/// Climate summary for one calendar month at one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyWeather {
    pub month: Month,
    pub season: Season,
    pub description: String,
    pub avg_temp: f64,
    pub avg_precip: f64,
    pub avg_wind: f64,
    pub precip_prob: f64,
    /// Present only for the current month.
    pub current: Option<CurrentConditions>,
}

impl MonthlyWeather {
    /// Row written when the archive had no days for this month.
    pub fn placeholder(month: Month) -> Self {
        Self {
            month,
            season: month.season(),
            description: NO_DATA_DESCRIPTION.to_string(),
            avg_temp: 0.0,
            avg_precip: 0.0,
            avg_wind: 0.0,
            precip_prob: 0.0,
            current: None,
        }
    }

    /// Replace the month's description with today's and attach the readings.
    pub fn overlay_current(&mut self, current: CurrentConditions) {
        self.description = current.description.clone();
        self.current = Some(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rain_dominates() {
        assert_eq!(describe_weather(20.0, 80.0, 30.0), "Cool and Rainy");
        assert_eq!(describe_weather(22.0, 80.0, 0.0), "Warm and Rainy");
        assert_eq!(describe_weather(35.0, 50.0, 40.0), "Partly Cloudy with Chance of Rain");
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(describe_weather(28.0, 70.0, 0.0), "Partly Cloudy with Chance of Rain");
        assert_eq!(describe_weather(28.0, 30.0, 0.0), "Warm and Sunny");
        assert_eq!(describe_weather(28.0, 0.0, 20.0), "Warm and Sunny");
        assert_eq!(describe_weather(30.0, 0.0, 0.0), "Warm and Sunny");
        assert_eq!(describe_weather(25.0, 0.0, 0.0), "Pleasant");
    }

    #[test]
    fn wind_beats_heat() {
        assert_eq!(describe_weather(33.0, 10.0, 25.0), "Windy");
        assert_eq!(describe_weather(33.0, 10.0, 5.0), "Hot and Sunny");
    }

    #[test]
    fn placeholder_uses_month_season() {
        let p = MonthlyWeather::placeholder(Month::June);
        assert_eq!(p.description, NO_DATA_DESCRIPTION);
        assert_eq!(p.season, Season::SouthwestMonsoon);
        assert_eq!(p.avg_temp, 0.0);
        assert!(p.current.is_none());
    }

    #[test]
    fn overlay_replaces_description() {
        let mut m = MonthlyWeather::placeholder(Month::May);
        m.overlay_current(CurrentConditions {
            temp: 29.0,
            max_temp: 31.0,
            min_temp: 25.0,
            precipitation: 3.2,
            precipitation_prob: 40.0,
            wind_speed: 12.0,
            description: "Partly Cloudy with Chance of Rain".into(),
        });
        assert_eq!(m.description, "Partly Cloudy with Chance of Rain");
        assert_eq!(m.current.as_ref().map(|c| c.max_temp), Some(31.0));
    }
}
