use crate::provider::ProviderKind;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("missing api key for provider {0}")]
    MissingApiKey(ProviderKind),
    #[error("invalid model id: {0:?}")]
    InvalidModel(String),
    #[error("failed to encode upstream request: {0}")]
    Encode(String),
    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}
