use reqwest::StatusCode;

/// Failures talking to the MangaDex API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP error: status code {0}")]
    Status(StatusCode),
    #[error("API error: {0}")]
    Api(String),
}

/// Failures navigating a paged result set.
#[derive(Debug, thiserror::Error)]
pub enum PagerError {
    #[error("failed to fetch page at offset {offset}: {source}")]
    FetchFailed {
        offset: usize,
        #[source]
        source: ApiError,
    },
    #[error("index {index} is out of range (total {total})")]
    IndexOutOfRange { index: usize, total: usize },
    #[error("nothing to show")]
    EmptyResult,
}

/// Failures turning a resource reference into pixels.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to fetch {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: ApiError,
    },
    #[error("failed to decode {url}: {source}")]
    DecodeFailed {
        url: String,
        #[source]
        source: image::ImageError,
    },
}
