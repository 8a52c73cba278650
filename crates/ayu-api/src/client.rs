//! HTTP client for the intake backend

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{
    AudioClip, BookingConfirmation, BookingRequest, ExchangeOutcome, ExchangeRequest,
    ExchangeResponse, FieldDescriptor, FieldType, Report, SpeechRequest,
};

/// Default backend base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// The backend performs AI generation per exchange, so requests can be slow.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the intake backend
#[derive(Debug, Clone)]
pub struct IntakeClient {
    client: reqwest::Client,
    base_url: String,
}

impl IntakeClient {
    /// Create a new client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url.into()),
        })
    }

    /// The configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run one intake exchange
    pub async fn exchange(&self, request: &ExchangeRequest) -> Result<ExchangeResponse> {
        let wire: ExchangeWire = self.post_json("/api/v1/json-intake", request).await?;
        lower_exchange(wire)
    }

    /// Synthesize speech for the given text in the given language
    pub async fn synthesize(&self, text: &str, language: &str) -> Result<AudioClip> {
        let request = SpeechRequest {
            text: text.to_string(),
            language: language.to_string(),
        };
        let wire: SpeechWire = self.post_json("/api/v1/tts", &request).await?;
        AudioClip::from_base64(&wire.audio_base64)
    }

    /// Book an appointment from a reviewed report
    pub async fn book(&self, request: &BookingRequest) -> Result<BookingConfirmation> {
        self.post_json("/api/v1/json-appointment", request).await
    }

    async fn post_json<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

fn normalize_base_url(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

// --- Wire shapes ---
//
// The backend response is a single loosely-typed object whose meaning depends
// on which fields are present. It is lowered into the closed domain types
// here; nothing outside this module sees the raw shape.

#[derive(Debug, Deserialize)]
struct ExchangeWire {
    #[serde(default)]
    question: String,
    #[serde(default)]
    field_key: Option<String>,
    #[serde(default)]
    expected_type: Option<String>,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    tts_audio_base64: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    is_complete: bool,
    #[serde(default)]
    report: Option<Report>,
}

#[derive(Debug, Deserialize)]
struct SpeechWire {
    audio_base64: String,
}

/// Lower the wire response into the validated domain response.
///
/// Precedence mirrors how the conversation consumes the response: an error
/// message wins over everything, then the completion flag, then the next
/// field. Selection fields without options and unknown type strings are
/// rejected here rather than left for the UI to render as a dead end.
fn lower_exchange(wire: ExchangeWire) -> Result<ExchangeResponse> {
    let speech = wire
        .tts_audio_base64
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(AudioClip::from_base64)
        .transpose()?;

    let outcome = if let Some(message) = wire.error_message {
        ExchangeOutcome::Rejected { message }
    } else if wire.is_complete {
        ExchangeOutcome::Complete(Box::new(wire.report.unwrap_or_default()))
    } else {
        let key = wire.field_key.ok_or_else(|| {
            Error::UnexpectedResponse(
                "response carries neither a field key nor a completion flag".to_string(),
            )
        })?;
        let raw_type = wire.expected_type.ok_or_else(|| {
            Error::UnexpectedResponse(format!("field {key:?} arrived without an expected type"))
        })?;
        let kind = FieldType::parse(&raw_type)?;

        let options = wire.options.unwrap_or_default();
        if kind.is_selection() && options.is_empty() {
            return Err(Error::MissingOptions { key });
        }

        ExchangeOutcome::Ask(FieldDescriptor {
            key,
            kind,
            options: if kind.is_selection() { options } else { Vec::new() },
        })
    };

    Ok(ExchangeResponse {
        question: wire.question,
        speech,
        outcome,
    })
}
