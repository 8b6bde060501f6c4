//! GeminiApiClient - Direct REST implementation of `CompletionClient`.
//!
//! Posts the transcript to `{base_url}/{model}:generateContent?key=...` and
//! returns the first candidate's text. Every failure maps to a
//! `CompletionError` carrying the fallback for the request's language.

use async_trait::async_trait;
use mindease_core::completion::{
    CompletionClient, CompletionError, CompletionErrorKind, CompletionRequest, FallbackMessages,
    GenerationConfig,
};
use mindease_core::config::{DEFAULT_GEMINI_BASE_URL, GeminiSettings};
use mindease_core::conversation::{Turn, TurnRole};
use mindease_core::secret::SecretService;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];
const BLOCK_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

/// Completion client that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    fallbacks: FallbackMessages,
}

impl GeminiApiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        fallbacks: FallbackMessages,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            fallbacks,
        }
    }

    /// Builds a client from secrets plus `[gemini]` settings.
    ///
    /// The model in secret.json wins over config.toml, matching how
    /// `mindease init` writes it.
    pub async fn from_secrets(
        secrets: &dyn SecretService,
        settings: &GeminiSettings,
        fallbacks: FallbackMessages,
    ) -> anyhow::Result<Self> {
        let secret_config = secrets
            .load_secrets()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load secrets: {}", e))?;

        let gemini = secret_config
            .gemini
            .ok_or_else(|| anyhow::anyhow!("Gemini configuration not found in secret.json"))?;

        if gemini.api_key.trim().is_empty() {
            anyhow::bail!("Gemini API key is empty; set GEMINI_API_KEY or edit secret.json");
        }

        let model = gemini
            .model_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| settings.model.clone());

        Ok(Self::new(gemini.api_key, model, fallbacks).with_base_url(settings.base_url.clone()))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the endpoint root (tests point this at a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_body(request: &CompletionRequest) -> GenerateContentRequest {
        let contents = request.transcript().iter().map(Content::from_turn).collect();

        let system_instruction = request.system_instruction().map(|text| Content {
            role: None,
            parts: vec![Part {
                text: text.to_string(),
            }],
        });

        let safety_settings = request.safety_filters().then(|| {
            HARM_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: (*category).to_string(),
                    threshold: BLOCK_THRESHOLD.to_string(),
                })
                .collect()
        });

        GenerateContentRequest {
            contents,
            generation_config: GenerationConfigPayload::from_config(request.generation()),
            system_instruction,
            safety_settings,
        }
    }

    async fn send_request(
        &self,
        body: &GenerateContentRequest,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError> {
        let language = request.language();
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            self.base_url,
            model = self.model,
            api_key = self.api_key
        );

        tracing::debug!(
            model = %self.model,
            turns = body.contents.len(),
            safety = body.safety_settings.is_some(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                // reqwest errors embed the URL, which carries the key.
                let detail = format!("Gemini API request failed: {}", err.without_url());
                self.fallbacks
                    .error(language, CompletionErrorKind::Transport, detail)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(self.map_http_error(status, body_text, request));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            self.fallbacks.error(
                language,
                CompletionErrorKind::MalformedBody,
                format!("Failed to parse Gemini response: {}", err.without_url()),
            )
        })?;

        extract_text_response(parsed).ok_or_else(|| {
            self.fallbacks.error(
                language,
                CompletionErrorKind::NoCandidate,
                "Gemini API returned no text in the response candidates",
            )
        })
    }

    fn map_http_error(
        &self,
        status: StatusCode,
        body: String,
        request: &CompletionRequest,
    ) -> CompletionError {
        let message = serde_json::from_str::<ErrorWrapper>(&body)
            .map(|wrapper| {
                let status_text = wrapper.error.status.unwrap_or_default();
                let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
                if status_text.is_empty() {
                    msg
                } else {
                    format!("{status_text}: {msg}")
                }
            })
            .unwrap_or_else(|_| body.clone());

        self.fallbacks.error(
            request.language(),
            CompletionErrorKind::Status(status.as_u16()),
            message,
        )
    }
}

#[async_trait]
impl CompletionClient for GeminiApiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = Self::build_body(request);
        self.send_request(&body, request).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfigPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    safety_settings: Option<Vec<SafetySetting>>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

impl Content {
    fn from_turn(turn: &Turn) -> Self {
        let role = match turn.role() {
            TurnRole::User => "user",
            TurnRole::Assistant => "model",
        };
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: turn.text().to_string(),
            }],
        }
    }
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl GenerationConfigPayload {
    /// `None` when every parameter is left to the backend default.
    fn from_config(config: &GenerationConfig) -> Option<Self> {
        if *config == GenerationConfig::default() {
            return None;
        }
        Some(Self {
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        })
    }
}

#[derive(Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Concatenates the text parts of the first candidate.
fn extract_text_response(response: GenerateContentResponse) -> Option<String> {
    let content = response
        .candidates?
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)?;

    let text: String = content.parts.into_iter().filter_map(|part| part.text).collect();

    if text.trim().is_empty() { None } else { Some(text) }
}
