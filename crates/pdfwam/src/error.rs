#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Cannot read {0}")]
    Input(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Analysis failed: {0}")]
    Analysis(String),
}

impl From<pdf::WamError> for Error {
    fn from(err: pdf::WamError) -> Self {
        Error::Analysis(err.to_string())
    }
}
