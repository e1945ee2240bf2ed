//! Component-level errors

use crate::codec::{CodecError, CodecId, EngineError};

/// Errors raised by the decoder component
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
  #[error("Failed to allocate {0}")]
  Allocation(&'static str),

  #[error("No decoder available for codec {0}")]
  CodecNotFound(CodecId),

  #[error("Failed to open {codec} decoder: {source}")]
  OpenFailed {
    codec: CodecId,
    #[source]
    source: EngineError,
  },

  #[error("Cannot convert decoded picture: {0}")]
  Conversion(#[source] CodecError),

  #[error("Configuration data arrived after the decoder was opened")]
  ExtradataFrozen,

  #[error("Bad port index {0}")]
  BadPortIndex(u32),

  #[error("Unsupported setting: {0}")]
  UnsupportedSetting(String),

  #[error("Incorrect state: {0}")]
  IncorrectState(&'static str),
}

impl ComponentError {
  /// Check if the error stops the component until reset
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      Self::Allocation(_) | Self::CodecNotFound(_) | Self::OpenFailed { .. } | Self::Conversion(_)
    )
  }
}

pub type ComponentResult<T> = Result<T, ComponentError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fatal_classification() {
    assert!(ComponentError::Allocation("frame").is_fatal());
    assert!(ComponentError::CodecNotFound(CodecId::Vp9).is_fatal());
    assert!(ComponentError::OpenFailed {
      codec: CodecId::H264,
      source: EngineError::failed(-22, "Invalid argument"),
    }
    .is_fatal());
    assert!(!ComponentError::ExtradataFrozen.is_fatal());
    assert!(!ComponentError::BadPortIndex(7).is_fatal());
  }

  #[test]
  fn test_error_messages() {
    assert_eq!(
      ComponentError::CodecNotFound(CodecId::Hevc).to_string(),
      "No decoder available for codec hevc"
    );
    assert_eq!(ComponentError::BadPortIndex(2).to_string(), "Bad port index 2");
  }
}
