use serde::Deserialize;

use crate::core::error::{ChatError, Result};

pub const OPENROUTER_MODELS_URL: &str = "https://openrouter.ai/api/v1/models";

#[derive(Deserialize)]
pub struct ModelsResponse {
    pub data: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub pricing: ModelPricing,
    #[serde(default)]
    pub context_length: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelPricing {
    pub prompt: String,
    pub completion: String,
}

impl ModelInfo {
    pub fn is_free(&self) -> bool {
        self.pricing.prompt == "0" && self.pricing.completion == "0"
    }

    /// The organization prefix of an OpenRouter id like `openai/gpt-4o`.
    pub fn org(&self) -> &str {
        self.id.split('/').next().unwrap_or(&self.id)
    }
}

/// Fetch the OpenRouter model catalog, sorted free-first and then by
/// organization and id for stable browsing.
pub async fn fetch_openrouter_models(
    client: &reqwest::Client,
    api_key: &str,
) -> Result<Vec<ModelInfo>> {
    let response = client
        .get(OPENROUTER_MODELS_URL)
        .header("Authorization", format!("Bearer {api_key}"))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ChatError::Provider(format!(
            "model listing failed with HTTP {}",
            response.status()
        )));
    }

    let listing: ModelsResponse = response.json().await?;
    let mut models = listing.data;
    models.sort_by(|a, b| {
        b.is_free()
            .cmp(&a.is_free())
            .then_with(|| a.org().cmp(b.org()))
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(models)
}
