use async_trait::async_trait;
use serde_json::Value;

use crate::models::FoodCandidate;

use super::CatalogSearch;

const SEARCH_URL: &str = "https://world.openfoodfacts.org/cgi/search.pl";

pub struct OpenFoodFactsClient {
    http: reqwest::Client,
}

impl OpenFoodFactsClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CatalogSearch for OpenFoodFactsClient {
    /// Любая ошибка транспорта или каталога сводится к пустому списку,
    /// наружу не выходит. Повторов нет, решение об этом за вызывающим.
    async fn search(&self, query: &str) -> Vec<FoodCandidate> {
        let response = match self
            .http
            .get(SEARCH_URL)
            .query(&[
                ("search_terms", query),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
                ("page_size", "20"),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Food catalog request failed: {}", e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            log::warn!("Food catalog returned status {}", response.status());
            return Vec::new();
        }

        match response.json::<Value>().await {
            Ok(data) => normalize_products(&data),
            Err(e) => {
                log::warn!("Food catalog returned unreadable body: {}", e);
                Vec::new()
            }
        }
    }
}

/// Приводит разнородные записи каталога к виду {имя, ккал на 100 г}.
/// Записи без имени или без обоих полей калорийности отбрасываются.
fn normalize_products(data: &Value) -> Vec<FoodCandidate> {
    let Some(products) = data.get("products").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for product in products {
        let Some(product) = product.as_object() else {
            continue;
        };

        let nutriments = product.get("nutriments").and_then(Value::as_object);
        let kcal = nutriments.and_then(|n| {
            numeric(n.get("energy-kcal_100g")).or_else(|| numeric(n.get("energy-kcal")))
        });
        let Some(kcal) = kcal else {
            continue;
        };
        if kcal <= 0.0 {
            continue;
        }

        let name = product
            .get("product_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("");
        if name.is_empty() {
            continue;
        }

        results.push(FoodCandidate {
            name: name.to_string(),
            kcal_per_100g: kcal,
        });
    }
    results
}

// Числовые поля каталога приходят то числом, то строкой.
fn numeric(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
