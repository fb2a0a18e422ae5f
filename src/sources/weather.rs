use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{http::ensure_success, SourceError};
use crate::config::WeatherLocation;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weather {
    pub current: CurrentWeather,
    pub daily: Vec<DailyForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub wind_speed: f64,
    pub weather_code: u8,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: String,
    pub weather_code: u8,
    pub description: &'static str,
    pub temperature_max: f64,
    pub temperature_min: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    wind_speed_10m: f64,
    weather_code: u8,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    weather_code: Vec<u8>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
}

pub async fn fetch_forecast(client: &Client, location: WeatherLocation) -> Result<Weather, SourceError> {
    let response = client
        .get(FORECAST_URL)
        .query(&[
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("current", "temperature_2m,weather_code,wind_speed_10m".to_string()),
            (
                "daily",
                "weather_code,temperature_2m_max,temperature_2m_min".to_string(),
            ),
            ("timezone", "auto".to_string()),
        ])
        .send()
        .await?;

    let body: ForecastResponse = ensure_success(response)?.json().await?;
    Ok(body.into())
}

impl From<ForecastResponse> for Weather {
    fn from(response: ForecastResponse) -> Self {
        let daily = &response.daily;
        let days = daily
            .time
            .iter()
            .zip(&daily.weather_code)
            .zip(daily.temperature_2m_max.iter().zip(&daily.temperature_2m_min))
            .map(|((date, &code), (&max, &min))| DailyForecast {
                date: date.clone(),
                weather_code: code,
                description: describe(code),
                temperature_max: max,
                temperature_min: min,
            })
            .collect();

        Weather {
            current: CurrentWeather {
                temperature: response.current.temperature_2m,
                wind_speed: response.current.wind_speed_10m,
                weather_code: response.current.weather_code,
                description: describe(response.current.weather_code),
            },
            daily: days,
        }
    }
}

/// WMO weather interpretation codes.
fn describe(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 | 77 => "Snow",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}
