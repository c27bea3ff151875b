//! Minimal Gemini `generateContent` + File API client.

use std::{path::Path, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use tokio::fs;
use tracing::{debug, info};

use crate::{
    config::Settings,
    error::{Result, ShotlistError},
    provider::Provider,
};

const ACTIVATION_POLL: Duration = Duration::from_secs(5);

/// One element of a request's `parts` array.
#[derive(Clone, Debug)]
pub enum Part {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
    FileData { mime_type: String, file_uri: String },
}

impl Part {
    fn to_json(&self) -> Value {
        match self {
            Part::Text(text) => json!({ "text": text }),
            Part::InlineData { mime_type, data } => json!({
                "inlineData": { "mimeType": mime_type, "data": STANDARD.encode(data) }
            }),
            Part::FileData {
                mime_type,
                file_uri,
            } => json!({
                "fileData": { "mimeType": mime_type, "fileUri": file_uri }
            }),
        }
    }
}

/// A file handed to the File API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub state: String,
}

impl UploadedFile {
    fn from_json(file: &Value) -> Option<Self> {
        Some(Self {
            name: file["name"].as_str()?.to_string(),
            uri: file["uri"].as_str()?.to_string(),
            mime_type: file["mimeType"].as_str().unwrap_or_default().to_string(),
            state: file["state"].as_str().unwrap_or("STATE_UNSPECIFIED").to_string(),
        })
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
    temperature: f32,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(provider: &Provider, api_key: String, settings: &Settings) -> Result<Self> {
        let config = provider.config();
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.to_string(),
            model: config.model.to_string(),
            api_key,
            temperature: settings.temperature,
            timeout: settings.request_timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Run one `generateContent` call and return the concatenated candidate text.
    /// With `json_output` the model is asked for `application/json`.
    pub async fn generate(
        &self,
        system_instruction: &str,
        parts: &[Part],
        json_output: bool,
    ) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        );
        let mut generation_config = json!({ "temperature": self.temperature });
        if json_output {
            generation_config["responseMimeType"] = json!("application/json");
        }

        let body = json!({
            "systemInstruction": { "parts": [{ "text": system_instruction }] },
            "contents": [{
                "role": "user",
                "parts": parts.iter().map(Part::to_json).collect::<Vec<_>>(),
            }],
            "generationConfig": generation_config,
        });

        info!(model = %self.model, parts = parts.len(), "calling generateContent");
        let response = self
            .send(
                self.http
                    .post(&url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&body),
                "analysis request",
            )
            .await?;
        let response: Value = self.checked_json(response).await?;

        candidate_text(&response)
    }

    /// Resumable upload: open a session, then send the bytes and finalize.
    pub async fn upload_file(&self, path: &Path, mime_type: &str) -> Result<UploadedFile> {
        let bytes = fs::read(path).await?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());

        info!(file = %display_name, bytes = bytes.len(), "starting File API upload");
        let start = self
            .send(
                self.http
                    .post(format!("{}/upload/v1beta/files", self.api_base))
                    .header("x-goog-api-key", &self.api_key)
                    .header("X-Goog-Upload-Protocol", "resumable")
                    .header("X-Goog-Upload-Command", "start")
                    .header("X-Goog-Upload-Header-Content-Length", bytes.len())
                    .header("X-Goog-Upload-Header-Content-Type", mime_type)
                    .json(&json!({ "file": { "display_name": display_name } })),
                "upload",
            )
            .await?;
        let start = ensure_success(start).await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ShotlistError::InvalidResponse {
                reason: "upload session has no x-goog-upload-url header".to_string(),
            })?;

        let finished = self
            .send(
                self.http
                    .post(upload_url)
                    .header("X-Goog-Upload-Offset", 0)
                    .header("X-Goog-Upload-Command", "upload, finalize")
                    .body(bytes),
                "upload",
            )
            .await?;
        let finished: Value = self.checked_json(finished).await?;

        let file = UploadedFile::from_json(&finished["file"]).ok_or_else(|| {
            ShotlistError::InvalidResponse {
                reason: format!("upload response has no file: {}", finished),
            }
        })?;
        debug!(name = %file.name, state = %file.state, "upload finished");
        Ok(file)
    }

    /// Poll the uploaded file until the service has finished processing it.
    pub async fn wait_until_active(&self, file: UploadedFile) -> Result<UploadedFile> {
        let poll = async {
            let mut file = file;
            loop {
                match file.state.as_str() {
                    "ACTIVE" => return Ok(file),
                    "FAILED" => {
                        return Err(ShotlistError::UploadNotActive {
                            name: file.name,
                            state: file.state,
                        });
                    }
                    _ => {}
                }
                debug!(name = %file.name, state = %file.state, "waiting for file to become active");
                tokio::time::sleep(ACTIVATION_POLL).await;

                let response = self
                    .send(
                        self.http
                            .get(format!("{}/v1beta/{}", self.api_base, file.name))
                            .header("x-goog-api-key", &self.api_key),
                        "file activation",
                    )
                    .await?;
                let body: Value = self.checked_json(response).await?;
                file = UploadedFile::from_json(&body).ok_or_else(|| {
                    ShotlistError::InvalidResponse {
                        reason: format!("file status response is malformed: {}", body),
                    }
                })?;
            }
        };

        tokio::time::timeout(self.timeout, poll)
            .await
            .map_err(|_| ShotlistError::Timeout {
                stage: "file activation",
                secs: self.timeout.as_secs(),
            })?
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        stage: &'static str,
    ) -> Result<reqwest::Response> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                ShotlistError::Timeout {
                    stage,
                    secs: self.timeout.as_secs(),
                }
            } else {
                ShotlistError::ApiError(e)
            }
        })
    }

    async fn checked_json(&self, response: reqwest::Response) -> Result<Value> {
        let response = ensure_success(response).await?;
        Ok(response.json::<Value>().await?)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ShotlistError::ServiceFailed {
        status: status.as_u16(),
        body,
    })
}

/// Join the text parts of the first candidate.
pub(crate) fn candidate_text(response: &Value) -> Result<String> {
    if let Some(reason) = response["promptFeedback"]["blockReason"].as_str() {
        return Err(ShotlistError::InvalidResponse {
            reason: format!("prompt blocked: {}", reason),
        });
    }

    let parts = response["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| ShotlistError::InvalidResponse {
            reason: format!("no candidate content in {}", response),
        })?;

    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        let finish = response["candidates"][0]["finishReason"]
            .as_str()
            .unwrap_or("UNKNOWN");
        return Err(ShotlistError::InvalidResponse {
            reason: format!("model returned no text (finishReason: {})", finish),
        });
    }

    Ok(text)
}
