// Current weather for a destination, from OpenWeatherMap

use crate::api::ClientConfig;
use crate::catalog::{Coordinates, Destination};
use crate::forms::ValidationError;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeatherError {
    #[error("Invalid API key or exceeded quota.")]
    InvalidApiKey,

    #[error("Weather not found")]
    NotFound,

    #[error("Unable to fetch weather: {0}")]
    NetworkError(String),

    #[error("Weather API key is not configured")]
    MissingApiKey,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherLocation {
    Coordinates(Coordinates),
    City(String),
}

impl WeatherLocation {
    // Coordinates take precedence over the place name
    pub fn resolve(city: Option<&str>, coords: Option<Coordinates>) -> Result<Self, ValidationError> {
        if let Some(coords) = coords {
            return Ok(WeatherLocation::Coordinates(coords));
        }
        match city.map(str::trim) {
            Some(city) if !city.is_empty() => Ok(WeatherLocation::City(city.to_string())),
            _ => Err(ValidationError::MissingLocation),
        }
    }

    pub fn for_destination(destination: &Destination) -> Result<Self, ValidationError> {
        Self::resolve(Some(&destination.name), destination.coords)
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            WeatherLocation::Coordinates(c) => {
                vec![("lat", c.lat.to_string()), ("lon", c.lng.to_string())]
            }
            WeatherLocation::City(city) => vec![("q", city.clone())],
        }
    }

    fn label(&self) -> Option<&str> {
        match self {
            WeatherLocation::City(city) => Some(city),
            WeatherLocation::Coordinates(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    #[serde(default)]
    humidity: u8,
}

#[derive(Debug, Default, Deserialize)]
struct OwmWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    main: OwmMain,
    #[serde(default)]
    wind: OwmWind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub place: String,
    pub temperature_c: i32,
    pub description: String,
    pub icon_url: Option<String>,
    pub humidity_pct: u8,
    pub wind_speed_ms: f64,
}

impl CurrentWeather {
    fn from_response(response: OwmResponse, location: &WeatherLocation) -> Self {
        let condition = response.weather.into_iter().next();
        let place = if response.name.is_empty() {
            location.label().unwrap_or_default().to_string()
        } else {
            response.name
        };

        CurrentWeather {
            place,
            temperature_c: response.main.temp.round() as i32,
            description: condition
                .as_ref()
                .map(|c| c.description.clone())
                .unwrap_or_default(),
            icon_url: condition
                .filter(|c| !c.icon.is_empty())
                .map(|c| format!("https://openweathermap.org/img/wn/{}@2x.png", c.icon)),
            humidity_pct: response.main.humidity,
            wind_speed_ms: response.wind.speed,
        }
    }
}

pub fn status_error(status_code: u16) -> WeatherError {
    if status_code == 401 {
        WeatherError::InvalidApiKey
    } else {
        WeatherError::NotFound
    }
}

pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(config: &ClientConfig) -> Result<Self, WeatherError> {
        let api_key = config
            .weather_api_key
            .clone()
            .ok_or(WeatherError::MissingApiKey)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| WeatherError::NetworkError(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.weather_base_url.clone(),
            api_key,
        })
    }

    pub async fn current(&self, location: &WeatherLocation) -> Result<CurrentWeather, WeatherError> {
        let mut params = location.query_params();
        params.push(("units", "metric".to_string()));
        params.push(("appid", self.api_key.clone()));

        debug!(location = ?location, "fetching weather");
        let response = self
            .http
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| WeatherError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "weather lookup failed");
            return Err(status_error(status.as_u16()));
        }

        let body: OwmResponse = response
            .json()
            .await
            .map_err(|_| WeatherError::NotFound)?;
        Ok(CurrentWeather::from_response(body, location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "Panaji",
        "weather": [{"main": "Rain", "description": "light rain", "icon": "10d"}],
        "main": {"temp": 28.6, "feels_like": 33.1, "humidity": 84},
        "wind": {"speed": 5.14}
    }"#;

    #[test]
    fn test_location_resolution() {
        let coords = Coordinates {
            lat: 15.49,
            lng: 73.82,
        };
        assert_eq!(
            WeatherLocation::resolve(Some("Goa"), Some(coords)),
            Ok(WeatherLocation::Coordinates(coords))
        );
        assert_eq!(
            WeatherLocation::resolve(Some(" Goa "), None),
            Ok(WeatherLocation::City("Goa".to_string()))
        );
        assert_eq!(
            WeatherLocation::resolve(Some(""), None),
            Err(ValidationError::MissingLocation)
        );
        assert_eq!(
            WeatherError::from(ValidationError::MissingLocation).to_string(),
            "No location provided"
        );
    }

    #[test]
    fn test_query_params() {
        let params = WeatherLocation::Coordinates(Coordinates { lat: 32.2, lng: 77.1 }).query_params();
        assert_eq!(params, vec![("lat", "32.2".to_string()), ("lon", "77.1".to_string())]);

        let params = WeatherLocation::City("Manali".to_string()).query_params();
        assert_eq!(params, vec![("q", "Manali".to_string())]);
    }

    #[test]
    fn test_response_normalization() {
        let response: OwmResponse = serde_json::from_str(SAMPLE).unwrap();
        let weather = CurrentWeather::from_response(response, &WeatherLocation::City("Goa".to_string()));

        assert_eq!(weather.place, "Panaji");
        assert_eq!(weather.temperature_c, 29);
        assert_eq!(weather.description, "light rain");
        assert_eq!(
            weather.icon_url.as_deref(),
            Some("https://openweathermap.org/img/wn/10d@2x.png")
        );
        assert_eq!(weather.humidity_pct, 84);
        assert_eq!(weather.wind_speed_ms, 5.14);
    }

    #[test]
    fn test_missing_name_falls_back_to_city() {
        let response: OwmResponse =
            serde_json::from_str(r#"{"weather": [], "main": {"temp": -0.4}}"#).unwrap();
        let weather = CurrentWeather::from_response(response, &WeatherLocation::City("Gulmarg".to_string()));
        assert_eq!(weather.place, "Gulmarg");
        assert_eq!(weather.temperature_c, 0);
        assert_eq!(weather.icon_url, None);
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(status_error(401).to_string(), "Invalid API key or exceeded quota.");
        assert_eq!(status_error(404).to_string(), "Weather not found");
        assert_eq!(status_error(500), WeatherError::NotFound);
    }

    #[test]
    fn test_client_requires_api_key() {
        assert!(matches!(
            WeatherClient::new(&ClientConfig::default()),
            Err(WeatherError::MissingApiKey)
        ));

        let config = ClientConfig {
            weather_api_key: Some("key".to_string()),
            ..Default::default()
        };
        assert!(WeatherClient::new(&config).is_ok());
    }
}
