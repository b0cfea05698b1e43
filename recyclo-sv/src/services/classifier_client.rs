//! Remote image classifier
//!
//! Sends the prepared image as PNG to an inference service and reads back
//! `{"probabilities": [...]}`.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use recyclo_common::classifier::Classifier;
use recyclo_common::{Error, Result};
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct PredictResponse {
    probabilities: Vec<f32>,
}

pub struct HttpClassifier {
    url: String,
    client: reqwest::Client,
}

impl HttpClassifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| Error::Internal(format!("PNG encoding failed: {}", e)))?;
    Ok(bytes)
}

#[async_trait]
impl Classifier for HttpClassifier {
    fn name(&self) -> &str {
        "http"
    }

    async fn predict(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let body = encode_png(image)?;
        debug!("Posting {} byte image to {}", body.len(), self.url);

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Classifier(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Classifier(format!(
                "inference service returned {}",
                response.status()
            )));
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| Error::Classifier(format!("invalid response body: {}", e)))?;

        Ok(parsed.probabilities)
    }
}
