#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}
