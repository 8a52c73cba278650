//! Capability seams between the runtime and the network

use async_trait::async_trait;
use ayu_api::{AudioClip, ExchangeRequest, ExchangeResponse, IntakeClient};

/// The exchange call the intake machine runs against. Implemented over HTTP
/// in production and by scripted mocks in tests.
#[async_trait]
pub trait IntakeService: Send + Sync {
    /// Run one intake exchange
    async fn exchange(&self, request: ExchangeRequest) -> ayu_api::Result<ExchangeResponse>;
}

/// Speech synthesis capability used by the demo sequencer and report views
#[async_trait]
pub trait SpeechSynth: Send + Sync {
    /// Synthesize speech for the given text in the given language
    async fn synthesize(&self, text: &str, language: &str) -> ayu_api::Result<AudioClip>;
}

/// HTTP-backed implementation over the intake backend
pub struct HttpIntakeService {
    client: IntakeClient,
}

impl HttpIntakeService {
    pub fn new(client: IntakeClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &IntakeClient {
        &self.client
    }
}

#[async_trait]
impl IntakeService for HttpIntakeService {
    async fn exchange(&self, request: ExchangeRequest) -> ayu_api::Result<ExchangeResponse> {
        self.client.exchange(&request).await
    }
}

#[async_trait]
impl SpeechSynth for HttpIntakeService {
    async fn synthesize(&self, text: &str, language: &str) -> ayu_api::Result<AudioClip> {
        self.client.synthesize(text, language).await
    }
}
