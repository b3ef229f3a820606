pub mod catalog;
pub mod weather;

pub use catalog::OpenFoodFactsClient;
pub use weather::OpenWeatherClient;

use async_trait::async_trait;

use crate::models::FoodCandidate;

/// Поиск по внешнему каталогу продуктов.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search(&self, query: &str) -> Vec<FoodCandidate>;
}

/// Текущая температура по названию города.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn current_temperature(&self, city: &str) -> f64;
}
