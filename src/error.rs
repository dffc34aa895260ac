use thiserror::Error;

/// Everything that can go wrong while scraping a cluster UI
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("No failed jobs for user {user}")]
    NoJobsForUser { user: String },

    #[error("Unexpected page layout at {url}: {detail}")]
    WrongDocumentShape { url: String, detail: String },

    #[error("Malformed embedded data: {detail}")]
    MalformedDocument { detail: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ScrapeError {
    pub(crate) fn wrong_shape(url: &str, detail: impl Into<String>) -> Self {
        Self::WrongDocumentShape {
            url: url.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedDocument {
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
