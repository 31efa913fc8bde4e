use crate::analysis::{GeminiClient, NutritionModel};
use crate::config::AppConfig;
use crate::history::HistoryStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub history: HistoryStore,
    pub model: Arc<dyn NutritionModel>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let history = HistoryStore::new(config.database_url.clone());
        history.initialize().await?;

        let model = Arc::new(GeminiClient::new(&config.gemini)) as Arc<dyn NutritionModel>;

        Ok(Self {
            config,
            history,
            model,
        })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        history: HistoryStore,
        model: Arc<dyn NutritionModel>,
    ) -> Self {
        Self {
            config,
            history,
            model,
        }
    }
}
