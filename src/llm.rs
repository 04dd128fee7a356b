use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::LlmConfig;
use crate::crawl::CrawledSite;
use crate::error::{AppError, Result};
use crate::prompt::{SYSTEM_PROMPT, build_prompt};

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f64,
}

/// Result of asking the model for brand-kit fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The object found in the reply, keys exactly as the model wrote them.
    Fields(Map<String, Value>),
    /// No usable object in the reply.
    Empty(String),
}

impl Extraction {
    pub fn into_fields(self) -> Map<String, Value> {
        match self {
            Extraction::Fields(fields) => fields,
            Extraction::Empty(_) => Map::new(),
        }
    }
}

/// Pulls the text between the first `{` and the last `}` of a reply and parses it as an object.
///
/// Replies with several JSON-like blocks are read as one span, which usually fails to parse.
pub fn parse_reply(reply: &str) -> Extraction {
    let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) else {
        return Extraction::Empty("no JSON object in reply".to_string());
    };
    if end < start {
        return Extraction::Empty("no JSON object in reply".to_string());
    }

    match serde_json::from_str::<Map<String, Value>>(&reply[start..=end]) {
        Ok(fields) => Extraction::Fields(fields),
        Err(e) => Extraction::Empty(format!("malformed JSON in reply: {}", e)),
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionClient {
    http: Client,
    config: LlmConfig,
}

impl ExtractionClient {
    pub fn new(http: Client, config: LlmConfig) -> Self {
        ExtractionClient { http, config }
    }

    pub async fn extract_brand_kit(&self, site: &CrawledSite) -> Result<Extraction> {
        let prompt = build_prompt(site);
        tracing::debug!(prompt_len = prompt.len(), "Built extraction prompt");

        let Some(reply) = self.complete(&prompt).await? else {
            tracing::warn!("LLM extraction error: reply carried no message content");
            return Ok(Extraction::Empty("reply carried no message content".to_string()));
        };

        let extraction = parse_reply(&reply);
        if let Extraction::Empty(reason) = &extraction {
            tracing::warn!(%reason, "LLM extraction error");
        }
        Ok(extraction)
    }

    /// Sends a single-turn chat request. `Ok(None)` means the service answered
    /// but the body had no message content to read.
    async fn complete(&self, prompt: &str) -> Result<Option<String>> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let res = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!("{}: {}", status, text)));
        }

        let json: Value = match res.json().await {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "LLM response body was not JSON");
                return Ok(None);
            }
        };

        Ok(json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string))
    }
}
