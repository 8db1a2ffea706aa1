//! Insight phrasing via a local LLM
//!
//! The engine's recommendations are plain rule output. A phraser turns them
//! into a short friendly narrative; it is optional and any failure simply
//! leaves the narrative out.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

const DEFAULT_MODEL: &str = "llama3.2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Turns rule-based recommendations into a narrative text
#[async_trait]
pub trait InsightPhraser: Send + Sync {
    async fn phrase(&self, recommendations: &[String]) -> Result<String>;
}

/// Phraser backed by Ollama's `/api/generate`
#[derive(Clone)]
pub struct OllamaPhraser {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaPhraser {
    pub fn new(base_url: &str, model: &str) -> Self {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables (`OLLAMA_HOST`, `OLLAMA_MODEL`)
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Some(Self::new(&host, &model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

fn build_prompt(recommendations: &[String]) -> String {
    let mut prompt = String::from(
        "Você é um assistente de finanças pessoais. Reescreva os alertas abaixo \
         como um resumo curto e amigável em português, sem inventar valores.\n\nAlertas:\n",
    );
    for line in recommendations {
        prompt.push_str("- ");
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt
}

#[async_trait]
impl InsightPhraser for OllamaPhraser {
    async fn phrase(&self, recommendations: &[String]) -> Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: build_prompt(recommendations),
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama phrasing response: {}", ollama_response.response);

        let text = ollama_response.response.trim();
        if text.is_empty() {
            return Err(Error::Phrasing("Empty response from model".into()));
        }
        Ok(text.to_string())
    }
}
