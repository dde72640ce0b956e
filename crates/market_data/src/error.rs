use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("no quote for {0}")]
    NotFound(String),
    #[error("feed could not be parsed: {0}")]
    Feed(#[from] rss::Error),
}
