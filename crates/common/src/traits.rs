use async_trait::async_trait;
use thiserror::Error;

use crate::models::ChartSpec;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("transport rejected the message: {0}")]
    Rejected(String),
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Outbound chat transport.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Sends an HTML-formatted text message.
    async fn send_text(&self, destination: i64, text: &str) -> Result<(), DeliveryError>;

    async fn send_photo(
        &self,
        destination: i64,
        image: Vec<u8>,
        caption: &str,
    ) -> Result<(), DeliveryError>;
}

/// Best-effort translation. Implementations return the input unchanged on any failure.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> String;
}

/// Turns a price tail and its reference levels into an image. `None` means no artifact.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, chart: &ChartSpec) -> Option<Vec<u8>>;
}

pub struct IdentityTranslator;

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(&self, text: &str) -> String {
        text.to_string()
    }
}

pub struct NoChart;

impl ChartRenderer for NoChart {
    fn render(&self, _chart: &ChartSpec) -> Option<Vec<u8>> {
        None
    }
}
