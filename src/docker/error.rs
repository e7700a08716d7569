#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported docker endpoint `{0}`, expected `unix://` or `tcp://`")]
    UnsupportedEndpoint(String),
    #[error("docker request failed: {0}")]
    Http(#[from] crate::http::Error),
    #[error("docker request to `{path}` returned status {status}")]
    Status {
        path: String,
        status: hyper::StatusCode,
    },
    #[error("failed to decode docker response from `{path}`: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Container(#[from] crate::container::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
