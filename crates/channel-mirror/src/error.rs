use std::fmt;

#[derive(Debug)]
pub enum MirrorError {
    InvalidArgument(String),
    NotFound(String),
    Other(String),
    KvStore(String),
    Serialization(String),
    IO(String),
    NotInitialized(String),
    Remote(String),      // 远端 RPC / 传输层错误
    DifferenceTooLong,   // 差异范围过大，当前设计不做历史重建
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorError::InvalidArgument(e) => write!(f, "Invalid argument: {}", e),
            MirrorError::NotFound(e) => write!(f, "Not found: {}", e),
            MirrorError::Other(e) => write!(f, "Other error: {}", e),
            MirrorError::KvStore(e) => write!(f, "KV store error: {}", e),
            MirrorError::Serialization(e) => write!(f, "Serialization error: {}", e),
            MirrorError::IO(e) => write!(f, "IO error: {}", e),
            MirrorError::NotInitialized(e) => write!(f, "Not initialized: {}", e),
            MirrorError::Remote(e) => write!(f, "Remote error: {}", e),
            MirrorError::DifferenceTooLong => {
                write!(f, "Channel difference too long: history gap exceeds diff window")
            }
        }
    }
}

impl std::error::Error for MirrorError {}

impl From<serde_json::Error> for MirrorError {
    fn from(error: serde_json::Error) -> Self {
        MirrorError::Serialization(error.to_string())
    }
}

impl From<sled::Error> for MirrorError {
    fn from(error: sled::Error) -> Self {
        MirrorError::KvStore(error.to_string())
    }
}

impl From<std::io::Error> for MirrorError {
    fn from(error: std::io::Error) -> Self {
        MirrorError::IO(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MirrorError>;
