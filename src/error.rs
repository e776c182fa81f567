use thiserror::Error;

/// Failures surfaced by an [`AccountStore`](crate::store::AccountStore)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("account {0} not found")]
    NotFound(i64),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("corrupt account record: {0}")]
    Corrupt(String),
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Failures while decoding or encoding a wire representation
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid XML body: {0}")]
    XmlDecode(#[from] quick_xml::de::DeError),
    #[error("cannot encode XML: {0}")]
    XmlEncode(#[from] quick_xml::se::SeError),
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
}

/// Failures while assembling the runtime configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
