//! `generateContent` transport over the browser's `fetch`.

use serde::Deserialize;
use serde_json::{Value, json};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::{
    BoilermakerPairing, CocktailIdentity, Prompt, boilermaker_prompt, cocktail_prompt,
    parse_identity, parse_pairing, parse_wisdom, wisdom_prompt,
};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, AdvisorResult};

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Request body for one prompt.
pub fn request_body(prompt: &Prompt) -> Value {
    let mut body = json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt.text }] }],
    });
    if let Some(system) = prompt.system {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    if let Some(schema) = &prompt.schema {
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        });
    }
    body
}

/// Concatenated text of the first candidate.
pub fn extract_text(raw: &str) -> AdvisorResult<String> {
    let response: GenerateResponse = serde_json::from_str(raw)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(AdvisorError::EmptyReply);
    }
    Ok(text)
}

fn transport(err: JsValue) -> AdvisorError {
    AdvisorError::Transport(format!("{err:?}"))
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: AdvisorConfig,
}

impl GeminiClient {
    pub fn new(config: AdvisorConfig) -> Self {
        Self { config }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    pub async fn generate(&self, prompt: &Prompt) -> AdvisorResult<String> {
        let body = request_body(prompt).to_string();

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_mode(RequestMode::Cors);
        init.set_body(&JsValue::from_str(&body));

        let request = Request::new_with_str_and_init(&self.url(), &init).map_err(transport)?;
        let headers = request.headers();
        headers
            .set("Content-Type", "application/json")
            .map_err(transport)?;
        headers
            .set("x-goog-api-key", &self.config.api_key)
            .map_err(transport)?;

        let window =
            web_sys::window().ok_or_else(|| AdvisorError::Transport("no window".to_string()))?;
        let value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(transport)?;
        let response: Response = value.dyn_into().map_err(transport)?;
        if !response.ok() {
            return Err(AdvisorError::Status {
                status: response.status(),
            });
        }
        let text = JsFuture::from(response.text().map_err(transport)?)
            .await
            .map_err(transport)?;
        let raw = text.as_string().ok_or(AdvisorError::EmptyReply)?;
        tracing::debug!(bytes = raw.len(), model = %self.config.model, "advisor reply received");
        extract_text(&raw)
    }

    pub async fn boilermaker(&self, mood: &str) -> AdvisorResult<BoilermakerPairing> {
        let text = self.generate(&boilermaker_prompt(mood)).await?;
        parse_pairing(&text)
    }

    pub async fn wisdom(&self, question: &str) -> AdvisorResult<String> {
        let text = self.generate(&wisdom_prompt(question)).await?;
        parse_wisdom(&text)
    }

    pub async fn cocktail_identity(&self, answers: &[String]) -> AdvisorResult<CocktailIdentity> {
        let text = self.generate(&cocktail_prompt(answers)).await?;
        parse_identity(&text)
    }
}
