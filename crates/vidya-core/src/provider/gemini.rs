//! Google Gemini provider implementations.
//!
//! [`GeminiClient`] calls `generateContent` for free-text and
//! schema-constrained generation. [`GeminiSearchAgent`] calls
//! `streamGenerateContent?alt=sse` with the `google_search` tool and turns
//! each SSE chunk into an [`AgentEvent`].
//!
//! Gemini streams text as deltas. The search agent accumulates them, so every
//! emitted event carries the full text so far and the chunk that carries a
//! `finishReason` is flagged final.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::GeminiConfig;
use crate::text::preview;

use super::trait_def::{EventStream, ReasoningProvider, SearchAgent};
use super::types::{AgentEvent, GenerateRequest, ProviderError, ResponseFormat, Session};

const PROVIDER: &str = "gemini";

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

fn build_http_client(config: &GeminiConfig) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| ProviderError::Request {
            provider: PROVIDER.to_string(),
            message: format!("failed to build HTTP client: {e}"),
        })
}

fn require_key(config: &GeminiConfig) -> Result<&str, ProviderError> {
    config
        .api_key
        .as_deref()
        .ok_or_else(|| ProviderError::MissingApiKey {
            provider: PROVIDER.to_string(),
        })
}

/// Build the endpoint URL. Auth uses the `key` query parameter.
fn endpoint_url(base_url: &str, model: &str, method: &str, api_key: &str) -> String {
    let sep = if method.contains('?') { '&' } else { '?' };
    format!("{base_url}/models/{model}:{method}{sep}key={api_key}")
}

// The URL carries the key, so strip it from transport errors.
fn request_error(err: reqwest::Error) -> ProviderError {
    ProviderError::Request {
        provider: PROVIDER.to_string(),
        message: err.without_url().to_string(),
    }
}

fn map_http_error(status: StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Auth {
            provider: PROVIDER.to_string(),
            status: status.as_u16(),
        },
        code => ProviderError::Api {
            provider: PROVIDER.to_string(),
            status: code,
            body: preview(body, 500),
        },
    }
}

fn contents_body(prompt: &str, system: Option<&str>) -> Value {
    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }],
        }],
    });
    if let Some(system) = system.filter(|s| !s.is_empty()) {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    body
}

fn build_generate_body(request: &GenerateRequest) -> Value {
    let mut body = contents_body(&request.prompt, request.system.as_deref());
    if let ResponseFormat::Json { schema } = &request.format {
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        });
    }
    body
}

fn build_search_body(message: &str, instruction: &str) -> Value {
    let mut body = contents_body(message, Some(instruction));
    body["tools"] = json!([{ "google_search": {} }]);
    body
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Concatenated text parts of the first candidate, if there is one.
fn candidate_text(data: &Value) -> Option<String> {
    let parts = data["candidates"]
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    Some(
        parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect(),
    )
}

/// An `error` object embedded in a 200 body or stream chunk.
fn embedded_error(data: &Value) -> Option<ProviderError> {
    let error = data.get("error")?;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let status = error
        .get("code")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .unwrap_or(0);
    Some(ProviderError::Api {
        provider: PROVIDER.to_string(),
        status,
        body: message.to_string(),
    })
}

fn parse_generate_response(body: &str) -> Result<String, ProviderError> {
    let data: Value = serde_json::from_str(body).map_err(|e| ProviderError::ResponseParse {
        provider: PROVIDER.to_string(),
        message: format!("invalid JSON envelope: {e}"),
    })?;
    if let Some(err) = embedded_error(&data) {
        return Err(err);
    }
    match candidate_text(&data) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ProviderError::EmptyResponse {
            provider: PROVIDER.to_string(),
        }),
    }
}

/// Fold one streamed chunk into the running text and produce its event.
fn decode_stream_chunk(data: &Value, accumulated: &mut String) -> Result<AgentEvent, ProviderError> {
    if let Some(err) = embedded_error(data) {
        return Err(err);
    }
    let delta = candidate_text(data).unwrap_or_default();
    let is_final = data["candidates"]
        .get(0)
        .and_then(|c| c.get("finishReason"))
        .and_then(Value::as_str)
        .is_some();
    accumulated.push_str(&delta);

    let carries_text = !accumulated.is_empty() && (!delta.is_empty() || is_final);
    Ok(AgentEvent {
        text: carries_text.then(|| accumulated.clone()),
        is_final,
    })
}

/// Decode one SSE line. Non-data lines and malformed payloads yield `None`.
fn parse_sse_line(line: &str, accumulated: &mut String) -> Option<Result<AgentEvent, ProviderError>> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    match serde_json::from_str::<Value>(payload) {
        Ok(data) => Some(decode_stream_chunk(&data, accumulated)),
        Err(e) => {
            warn!(error = %e, data_preview = %preview(payload, 200), "skipping malformed SSE chunk");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Reasoning provider backed by `generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
    model: String,
    name: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, model: impl Into<String>) -> Result<Self, ProviderError> {
        let model = model.into();
        Ok(Self {
            http: build_http_client(config)?,
            config: config.clone(),
            name: format!("{PROVIDER}:{model}"),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ReasoningProvider for GeminiClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        let api_key = require_key(&self.config)?;
        let url = endpoint_url(&self.config.base_url, &self.model, "generateContent", api_key);
        let body = build_generate_body(request);

        debug!(
            provider = %self.name,
            prompt_chars = request.prompt.chars().count(),
            structured = matches!(request.format, ResponseFormat::Json { .. }),
            "sending generateContent request"
        );

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let text = response.text().await.map_err(request_error)?;
        if !status.is_success() {
            return Err(map_http_error(status, &text));
        }

        let reply = parse_generate_response(&text)?;
        debug!(provider = %self.name, reply_chars = reply.chars().count(), "generateContent reply received");
        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// GeminiSearchAgent
// ---------------------------------------------------------------------------

/// Search agent backed by streamed `generateContent` with Google Search grounding.
#[derive(Debug, Clone)]
pub struct GeminiSearchAgent {
    http: Client,
    config: GeminiConfig,
    model: String,
    instruction: String,
    name: String,
}

impl GeminiSearchAgent {
    /// `instruction` becomes the system instruction of every run.
    pub fn new(
        config: &GeminiConfig,
        model: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let model = model.into();
        Ok(Self {
            http: build_http_client(config)?,
            config: config.clone(),
            name: format!("{PROVIDER}-search:{model}"),
            model,
            instruction: instruction.into(),
        })
    }
}

impl SearchAgent for GeminiSearchAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, session: &Session, message: &str) -> EventStream {
        let http = self.http.clone();
        let config = self.config.clone();
        let model = self.model.clone();
        let body = build_search_body(message, &self.instruction);
        let session_id = session.id.clone();
        let user_id = session.user_id.clone();

        let stream = async_stream::stream! {
            let api_key = match require_key(&config) {
                Ok(key) => key.to_string(),
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let url = endpoint_url(&config.base_url, &model, "streamGenerateContent?alt=sse", &api_key);

            debug!(%session_id, %user_id, %model, "starting search agent run");

            let response = match http.post(&url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    yield Err(request_error(e));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                yield Err(map_http_error(status, &text));
                return;
            }

            let mut bytes = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();
            let mut accumulated = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(ProviderError::Stream {
                            provider: PROVIDER.to_string(),
                            message: e.without_url().to_string(),
                        });
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let raw: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&raw);
                    match parse_sse_line(line.trim(), &mut accumulated) {
                        Some(Ok(event)) => {
                            yield Ok(event);
                        }
                        Some(Err(e)) => {
                            yield Err(e);
                            return;
                        }
                        None => {}
                    }
                }
            }

            let rest = String::from_utf8_lossy(&buffer).into_owned();
            if let Some(event) = parse_sse_line(rest.trim(), &mut accumulated) {
                yield event;
            }
        };

        Box::pin(stream)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, finish: Option<&str>) -> Value {
        let mut candidate = json!({ "content": { "role": "model", "parts": [{ "text": text }] } });
        if let Some(reason) = finish {
            candidate["finishReason"] = json!(reason);
        }
        json!({ "candidates": [candidate] })
    }

    #[test]
    fn endpoint_url_appends_key() {
        assert_eq!(
            endpoint_url("https://x/v1beta", "m", "generateContent", "k"),
            "https://x/v1beta/models/m:generateContent?key=k"
        );
        assert_eq!(
            endpoint_url("https://x/v1beta", "m", "streamGenerateContent?alt=sse", "k"),
            "https://x/v1beta/models/m:streamGenerateContent?alt=sse&key=k"
        );
    }

    #[test]
    fn generate_body_for_text_has_no_generation_config() {
        let body = build_generate_body(&GenerateRequest::text("hi"));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert!(body.get("generationConfig").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn generate_body_for_json_sets_schema() {
        let schema = json!({ "type": "OBJECT" });
        let req = GenerateRequest::json("plan", schema.clone()).with_system("sys");
        let body = build_generate_body(&req);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"], schema);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
    }

    #[test]
    fn search_body_enables_google_search() {
        let body = build_search_body("find syllabus", "you research");
        assert_eq!(body["tools"][0], json!({ "google_search": {} }));
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "you research");
    }

    #[test]
    fn http_errors_map_auth_separately() {
        assert!(matches!(
            map_http_error(StatusCode::FORBIDDEN, ""),
            ProviderError::Auth { status: 403, .. }
        ));
        assert!(matches!(
            map_http_error(StatusCode::UNAUTHORIZED, ""),
            ProviderError::Auth { status: 401, .. }
        ));
        assert!(matches!(
            map_http_error(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            ProviderError::Api { status: 429, .. }
        ));
    }

    #[test]
    fn parse_generate_response_joins_parts() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        })
        .to_string();
        assert_eq!(parse_generate_response(&body).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn parse_generate_response_errors() {
        assert!(matches!(
            parse_generate_response("not json"),
            Err(ProviderError::ResponseParse { .. })
        ));
        assert!(matches!(
            parse_generate_response(r#"{"candidates":[]}"#),
            Err(ProviderError::EmptyResponse { .. })
        ));
        assert!(matches!(
            parse_generate_response(r#"{"error":{"code":400,"message":"bad"}}"#),
            Err(ProviderError::Api { status: 400, .. })
        ));
    }

    #[test]
    fn out_of_range_error_code_maps_to_zero() {
        assert!(matches!(
            parse_generate_response(r#"{"error":{"code":65936,"message":"odd"}}"#),
            Err(ProviderError::Api { status: 0, .. })
        ));
    }

    #[test]
    fn stream_chunks_accumulate_text() {
        let mut acc = String::new();
        let first = decode_stream_chunk(&chunk("Units: ", None), &mut acc).unwrap();
        let second = decode_stream_chunk(&chunk("1-5", Some("STOP")), &mut acc).unwrap();
        assert_eq!(first, AgentEvent::partial("Units: "));
        assert_eq!(second, AgentEvent::final_response("Units: 1-5"));
    }

    #[test]
    fn chunk_without_text_carries_none() {
        let mut acc = String::new();
        let event = decode_stream_chunk(&json!({ "usageMetadata": {} }), &mut acc).unwrap();
        assert_eq!(event, AgentEvent::empty());
    }

    #[test]
    fn sse_lines_are_filtered() {
        let mut acc = String::new();
        assert!(parse_sse_line("", &mut acc).is_none());
        assert!(parse_sse_line("event: message", &mut acc).is_none());
        assert!(parse_sse_line("data: {not json", &mut acc).is_none());
        let line = format!("data: {}", chunk("hello", None));
        let event = parse_sse_line(&line, &mut acc).unwrap().unwrap();
        assert_eq!(event.text.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn missing_key_fails_on_first_call() {
        let config = GeminiConfig::new(None);
        let client = GeminiClient::new(&config, "gemini-2.0-flash").unwrap();
        let err = client
            .generate(&GenerateRequest::text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey { .. }));
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn search_agent_missing_key_yields_error_item() {
        let config = GeminiConfig::new(None);
        let agent = GeminiSearchAgent::new(&config, "gemini-2.0-flash", "research").unwrap();
        let session = Session {
            id: "s".to_string(),
            app_name: "a".to_string(),
            user_id: "u".to_string(),
        };
        let items: Vec<_> = agent.run(&session, "q").collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(ProviderError::MissingApiKey { .. })));
    }

    #[test]
    fn names_include_model() {
        let config = GeminiConfig::new(Some("k".to_string()));
        let client = GeminiClient::new(&config, "gemini-2.0-flash").unwrap();
        assert_eq!(client.name(), "gemini:gemini-2.0-flash");
        assert_eq!(client.model(), "gemini-2.0-flash");
        let agent = GeminiSearchAgent::new(&config, "gemini-2.0-flash", "").unwrap();
        assert_eq!(agent.name(), "gemini-search:gemini-2.0-flash");
    }
}
