use std::time::Duration;

use async_trait::async_trait;

use crate::config::GeneratorConfig;
use crate::descriptor::{CarDescriptor, GenerationRequest};
use crate::error::{GeneratorError, GeneratorResult};

const GENERATE_PATH: &str = "/api/cars/generate";
const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

/// Source of generated car descriptors.
#[async_trait]
pub trait PartGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> GeneratorResult<CarDescriptor>;
}

/// [`PartGenerator`] backed by the generator's HTTP API.
#[derive(Clone, Debug)]
pub struct HttpPartGenerator {
    client: reqwest::Client,
    url: String,
}

impl HttpPartGenerator {
    pub fn new(config: &GeneratorConfig) -> GeneratorResult<Self> {
        let endpoint = config.endpoint.trim_end_matches('/');
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(GeneratorError::InvalidEndpoint(config.endpoint.clone()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!("{endpoint}{GENERATE_PATH}"),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PartGenerator for HttpPartGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GeneratorResult<CarDescriptor> {
        tracing::debug!(url = %self.url, prompt = %request.prompt, "requesting car generation");
        let response = self.client.post(&self.url).json(request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let mut body = body;
            if body.len() > MAX_ERROR_BODY_BYTES {
                let mut cut = MAX_ERROR_BODY_BYTES;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
                body.push_str("...(truncated)");
            }
            tracing::warn!(status = status.as_u16(), "generator request failed");
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let descriptor = CarDescriptor::from_json(&body)?;
        tracing::info!(parts = descriptor.parts.len(), "car descriptor generated");
        Ok(descriptor)
    }
}
