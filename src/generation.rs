// Product Title Generation Client
//
// Asks a Gemini model for SEO-friendly alternatives to an example product
// title. Independent of the signed Lazada client; it only shares the
// transport seam and the error model.

use crate::dispatch::{map_response, OutgoingRequest, ReqwestTransport, Transport};
use crate::types::*;
use crate::utils::json_extractor::extract_json;
use crate::utils::{validate_range, StringValidator};
use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_GENERATION_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const FAST_MODEL: &str = "gemini-flash-lite-latest";
pub const THINKING_MODEL: &str = "gemini-2.5-pro";
pub const THINKING_BUDGET: u32 = 32768;
pub const MAX_TITLES: u32 = 20;

/// Header carrying the API key. The key never goes in the URL.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

const SYSTEM_INSTRUCTION: &str = "You are an expert SEO and e-commerce copywriter. \
Your task is to generate compelling product titles based on user examples. \
Output only a valid JSON array of strings.";

/// What to generate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRequest {
    pub example_title: String,
    pub count: u32,
    /// Use the slower reasoning model with a thinking budget
    pub thinking: bool,
}

impl TitleRequest {
    pub fn new(example_title: impl Into<String>, count: u32) -> Self {
        Self {
            example_title: example_title.into(),
            count,
            thinking: false,
        }
    }

    pub fn thinking(mut self, enabled: bool) -> Self {
        self.thinking = enabled;
        self
    }

    pub fn model(&self) -> &'static str {
        if self.thinking {
            THINKING_MODEL
        } else {
            FAST_MODEL
        }
    }

    pub fn validate(&self) -> ApiResult<()> {
        StringValidator::not_empty(self.example_title.as_str(), "example_title")?;
        StringValidator::max_length(self.example_title.as_str(), 500, "example_title")?;
        validate_range(self.count, 1, MAX_TITLES, "count")?;
        Ok(())
    }

    pub fn prompt(&self) -> String {
        format!(
            "You are an expert in SEO and e-commerce marketing. Based on the following example \
product title, generate a list of {} unique, creative, and highly SEO-friendly alternative \
product titles. The titles should be catchy and appeal to online shoppers.\n\n\
Example Title: \"{}\"\n\n\
Provide the output as a JSON array of strings. Do not include any other text or explanations in your response.",
            self.count, self.example_title
        )
    }

    fn to_body(&self) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: TextContent::new(None, SYSTEM_INSTRUCTION),
            contents: vec![TextContent::new(Some("user"), self.prompt())],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: serde_json::json!({
                    "type": "ARRAY",
                    "items": {
                        "type": "STRING",
                        "description": "An SEO-friendly product title."
                    }
                }),
                thinking_config: self.thinking.then_some(ThinkingConfig {
                    thinking_budget: THINKING_BUDGET,
                }),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: TextContent,
    contents: Vec<TextContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct TextContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<TextPart>,
}

impl TextContent {
    fn new(role: Option<&'static str>, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![TextPart { text: text.into() }],
        }
    }
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

/// Client for generating product titles
#[derive(Clone)]
pub struct TitleGenerator {
    api_key: SecureAppSecret,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl TitleGenerator {
    pub fn new(api_key: impl Into<String>) -> ApiResult<Self> {
        let api_key = StringValidator::not_empty(api_key, "api_key")?;
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| {
                ApiError::configuration_error(format!("failed to create HTTP client: {}", e), None)
            })?;

        Ok(Self {
            api_key: SecureAppSecret::new(api_key),
            base_url: DEFAULT_GENERATION_URL.to_string(),
            transport: Arc::new(ReqwestTransport::from_client(http_client)),
        })
    }

    /// Read the key from `GEMINI_API_KEY`, falling back to `API_KEY`
    pub fn from_env() -> ApiResult<Self> {
        let key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .map_err(|_| ApiError::simple_configuration_error("GEMINI_API_KEY is not set"))?;
        Self::new(key)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Generate alternative titles. One request, no retries.
    pub async fn generate_titles(&self, request: &TitleRequest) -> ApiResult<Vec<String>> {
        request.validate()?;

        let body = serde_json::to_vec(&request.to_body()).map_err(|e| {
            ApiError::configuration_error(format!("failed to serialize request: {}", e), None)
        })?;
        let url = url::Url::parse(&format!(
            "{}/models/{}:generateContent",
            self.base_url,
            request.model()
        ))
        .map_err(|e| ApiError::simple_configuration_error(format!("invalid generation URL: {}", e)))?;

        let outgoing = OutgoingRequest {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![(API_KEY_HEADER.to_string(), self.api_key.as_str().to_string())],
            body: Some(body),
        };

        tracing::debug!(
            url = %outgoing.url,
            model = request.model(),
            count = request.count,
            "requesting title suggestions"
        );
        let response = map_response(self.transport.execute(outgoing).await?)?;
        decode_titles(&response.payload)
    }
}

impl std::fmt::Debug for TitleGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TitleGenerator")
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Pull the title list out of a `generateContent` response.
///
/// Every way this can go wrong is a `ProtocolError`: no candidates, no
/// text parts, text that is not JSON, or JSON that is not a string array.
pub fn decode_titles(payload: &Value) -> ApiResult<Vec<String>> {
    let parts = payload
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            let reason = payload
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
                .map(|r| format!("response has no candidates (blocked: {})", r))
                .unwrap_or_else(|| "response has no candidate content".to_string());
            ApiError::simple_protocol_error(reason, None)
        })?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() {
        return Err(ApiError::simple_protocol_error("candidate contains no text", None));
    }

    let json = extract_json(&text)?;
    let titles: Vec<String> = serde_json::from_str(&json).map_err(|e| {
        ApiError::protocol_error(
            format!("generated text is not a JSON array of strings: {}", e),
            None,
            Some(sanitize_error_message(&json)),
            Some(e),
            Some(concat!(file!(), ":", line!())),
        )
    })?;

    Ok(titles
        .into_iter()
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .collect())
}
