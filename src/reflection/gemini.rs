//! Google Generative Language (`generateContent`) wire format and client.
//!
//! Encoding / decoding are plain functions so they can be tested on the host;
//! only the HTTP client itself is wasm-only.

use serde::{Deserialize, Serialize};

use super::GenerationRequest;
use crate::error::{GenerationError, classify_failure};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

pub fn encode_request(request: &GenerationRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: None,
            parts: vec![Part { text: Some(request.prompt.clone()) }],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            top_p: request.top_p,
        },
    }
}

pub fn endpoint_url(base: &str, model: &str) -> String {
    format!("{}/v1beta/models/{}:generateContent", base.trim_end_matches('/'), model)
}

/// Turn an HTTP status + body into the text of the first candidate.
/// The text may be empty; judging that is the generator's job.
pub fn decode_response(status: u16, body: &str) -> Result<String, GenerationError> {
    if !(200..300).contains(&status) {
        return Err(match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(env) => {
                let code = if env.error.code != 0 { env.error.code } else { status };
                classify_failure(code, &format!("{} {}", env.error.status, env.error.message))
            }
            Err(_) => classify_failure(status, body),
        });
    }

    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default();
    Ok(text)
}

#[cfg(target_arch = "wasm32")]
pub use client::GeminiClient;

#[cfg(target_arch = "wasm32")]
mod client {
    use async_trait::async_trait;
    use gloo_net::http::Request;

    use super::{decode_response, encode_request, endpoint_url};
    use crate::config::VignetteConfig;
    use crate::error::GenerationError;
    use crate::reflection::{GenerationRequest, TextService};

    /// Browser `fetch` client for the Generative Language API.
    pub struct GeminiClient {
        endpoint: String,
        api_key: Option<String>,
    }

    impl GeminiClient {
        pub fn from_config(config: &VignetteConfig) -> Self {
            Self {
                endpoint: config.endpoint.clone(),
                api_key: config.api_key().map(str::to_string),
            }
        }
    }

    #[async_trait(?Send)]
    impl TextService for GeminiClient {
        async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            let key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;
            let url = endpoint_url(&self.endpoint, &request.model);
            let response = Request::post(&url)
                .header("x-goog-api-key", key)
                .json(&encode_request(request))
                .map_err(|e| GenerationError::RequestFailed(e.to_string()))?
                .send()
                .await
                .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
            decode_response(status, &body)
        }
    }
}
