//! groundqa-llm
//!
//! Chat-completion backends for answer generation: any OpenAI-compatible API
//! (Groq by default) and a local Ollama server.

use std::future::Future;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use groundqa_core::config::{LlmConfig, LlmProvider};
use groundqa_core::error::{Error, Result, Stage};
use groundqa_core::traits::Generator;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Message {
    role: String,
    content: String,
}

impl Message {
    fn user(content: &str) -> Self {
        Self { role: "user".to_string(), content: content.to_string() }
    }
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: Message,
}

pub struct OpenAiGenerator {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiGenerator {
    pub fn new(client: reqwest::Client, config: &LlmConfig) -> Result<Self> {
        let api_key = match &config.api_key {
            Some(key) if !key.trim().is_empty() => key.clone(),
            _ => std::env::var(&config.api_key_env).map_err(|_| {
                Error::InvalidConfig(format!("llm.api_key is unset and {} is not in the environment", config.api_key_env))
            })?,
        };
        Ok(Self {
            client,
            url: format!("{}/v1/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let req = OpenAiChatRequest { model: &self.model, messages: vec![Message::user(prompt)], temperature: self.temperature };
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("Failed to call chat completions API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Chat completions API returned {status}: {body}");
        }

        let body: OpenAiChatResponse = resp.json().await.context("Malformed chat completions response")?;
        first_choice(body)
    }
}

fn first_choice(body: OpenAiChatResponse) -> anyhow::Result<String> {
    body.choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| anyhow::anyhow!("Chat completions response has no choices"))
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Message,
}

pub struct OllamaGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    temperature: f32,
}

impl OllamaGenerator {
    pub fn new(client: reqwest::Client, config: &LlmConfig) -> Self {
        Self {
            client,
            url: format!("{}/api/chat", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    pub async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let req = OllamaChatRequest {
            model: &self.model,
            messages: vec![Message::user(prompt)],
            stream: false,
            options: OllamaOptions { temperature: self.temperature },
        };
        let resp = self.client.post(&self.url).json(&req).send().await.context("Failed to call Ollama chat API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Ollama chat API returned {status}: {body}");
        }

        let body: OllamaChatResponse = resp.json().await.context("Malformed Ollama chat response")?;
        Ok(body.message.content)
    }
}

// ─── Selection ───────────────────────────────────────────

pub enum LlmGenerator {
    OpenAi(OpenAiGenerator),
    Ollama(OllamaGenerator),
}

impl Generator for LlmGenerator {
    fn generate(&self, prompt: &str) -> impl Future<Output = anyhow::Result<String>> + Send {
        async move {
            match self {
                LlmGenerator::OpenAi(g) => g.complete(prompt).await,
                LlmGenerator::Ollama(g) => g.complete(prompt).await,
            }
        }
    }
}

/// Backend for `config.provider`. Fails early when the OpenAI-compatible
/// provider has no API key.
pub fn build_generator(config: &LlmConfig) -> Result<LlmGenerator> {
    let client = reqwest::Client::builder().build().map_err(|e| Error::backend(Stage::Generation, e))?;
    let generator = match config.provider {
        LlmProvider::OpenAi => LlmGenerator::OpenAi(OpenAiGenerator::new(client, config)?),
        LlmProvider::Ollama => LlmGenerator::Ollama(OllamaGenerator::new(client, config)),
    };
    debug!(provider = ?config.provider, model = %config.model, "language model backend ready");
    Ok(generator)
}
