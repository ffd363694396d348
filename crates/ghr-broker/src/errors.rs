use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("http request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("response carried no registration token")]
    MissingToken,
}
