use async_trait::async_trait;
use serde_json::Value;

use super::WeatherLookup;

const WEATHER_URL: &str = "http://api.openweathermap.org/data/2.5/weather";

/// Ответ пришёл, но без температуры (не-200 или нет поля main.temp).
pub const FALLBACK_TEMP_C: f64 = 15.0;
/// Запрос упал до получения пригодного ответа.
pub const TRANSPORT_FALLBACK_TEMP_C: f64 = 20.0;

pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    /// Никогда не возвращает ошибку: при любом сбое отдаёт
    /// подстраховочную температуру.
    async fn current_temperature(&self, city: &str) -> f64 {
        let response = match self
            .http
            .get(WEATHER_URL)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Weather request failed: {}", e);
                return TRANSPORT_FALLBACK_TEMP_C;
            }
        };

        if !response.status().is_success() {
            log::warn!("Weather service returned status {}", response.status());
            return FALLBACK_TEMP_C;
        }

        let data = match response.json::<Value>().await {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Weather service returned unreadable body: {}", e);
                return TRANSPORT_FALLBACK_TEMP_C;
            }
        };

        data.get("main")
            .and_then(|main| main.get("temp"))
            .and_then(Value::as_f64)
            .unwrap_or(FALLBACK_TEMP_C)
    }
}
