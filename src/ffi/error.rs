//! FFmpeg error handling
//!
//! Return codes of the libav* calls the decoder makes and their mapping
//! onto [`EngineError`].

use std::ffi::CStr;
use std::os::raw::c_int;

use crate::codec::EngineError;

// ============================================================================
// FFmpeg Error Codes
// ============================================================================

/// End of file / stream reached
pub const AVERROR_EOF: c_int = fferrtag(b'E', b'O', b'F', b' ');

/// Decoder not found
pub const AVERROR_DECODER_NOT_FOUND: c_int = fferrtag(0xF8, b'D', b'E', b'C');

/// Invalid data found
pub const AVERROR_INVALIDDATA: c_int = fferrtag(b'I', b'N', b'D', b'A');

/// Resource temporarily unavailable (try again)
/// Linux: EAGAIN = 11, macOS: EAGAIN = 35
#[cfg(target_os = "macos")]
pub const AVERROR_EAGAIN: c_int = -35;

#[cfg(not(target_os = "macos"))]
pub const AVERROR_EAGAIN: c_int = -11;

/// Out of memory
pub const AVERROR_ENOMEM: c_int = -12;

/// Invalid argument
pub const AVERROR_EINVAL: c_int = -22;

/// Create FFmpeg error tag from 4 bytes
const fn fferrtag(a: u8, b: u8, c: u8, d: u8) -> c_int {
  -((a as c_int) | ((b as c_int) << 8) | ((c as c_int) << 16) | ((d as c_int) << 24))
}

// ============================================================================
// FFmpeg Error Type
// ============================================================================

/// Failed libav* call: negative return code plus its `av_strerror` text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("FFmpeg error {code}: {message}")]
pub struct FFmpegError {
  pub code: c_int,
  pub message: String,
}

impl FFmpegError {
  /// Look up the message for `code`
  pub fn from_code(code: c_int) -> Self {
    Self {
      code,
      message: get_error_message(code),
    }
  }

  pub fn new(code: c_int, message: impl Into<String>) -> Self {
    Self {
      code,
      message: message.into(),
    }
  }
}

impl From<FFmpegError> for EngineError {
  fn from(err: FFmpegError) -> Self {
    match err.code {
      AVERROR_EAGAIN => EngineError::Again,
      AVERROR_EOF => EngineError::Eof,
      code => EngineError::Failed {
        code,
        message: err.message,
      },
    }
  }
}

// ============================================================================
// Result Type
// ============================================================================

/// Result type for FFmpeg operations
pub type FFmpegResult<T> = Result<T, FFmpegError>;

/// Check FFmpeg return code and convert to Result
///
/// Returns Ok with the value if >= 0, Err with FFmpegError if < 0
#[inline]
pub fn check_error(ret: c_int) -> FFmpegResult<c_int> {
  if ret < 0 {
    Err(FFmpegError::from_code(ret))
  } else {
    Ok(ret)
  }
}

/// Check a return code of the two-phase decode API
///
/// EAGAIN and EOF map to their sentinels without a message lookup.
#[inline]
pub fn check_engine(ret: c_int) -> Result<(), EngineError> {
  match ret {
    r if r >= 0 => Ok(()),
    AVERROR_EAGAIN => Err(EngineError::Again),
    AVERROR_EOF => Err(EngineError::Eof),
    r => Err(FFmpegError::from_code(r).into()),
  }
}

/// Get error message for an FFmpeg error code
pub fn get_error_message(code: c_int) -> String {
  let mut buf = [0 as std::os::raw::c_char; 256];
  unsafe {
    super::avutil::av_strerror(code, buf.as_mut_ptr(), buf.len());
    CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_codes() {
    assert!(AVERROR_EOF < 0);
    assert!(AVERROR_EAGAIN < 0);
    assert!(AVERROR_EINVAL < 0);
    assert_eq!(AVERROR_INVALIDDATA, -1_094_995_529);
  }

  #[test]
  fn test_engine_sentinels() {
    assert_eq!(check_engine(0), Ok(()));
    assert_eq!(check_engine(AVERROR_EAGAIN), Err(EngineError::Again));
    assert_eq!(check_engine(AVERROR_EOF), Err(EngineError::Eof));
  }

  #[test]
  fn test_into_engine_error() {
    let err: EngineError = FFmpegError::new(AVERROR_EINVAL, "Invalid argument").into();
    assert_eq!(err, EngineError::failed(AVERROR_EINVAL, "Invalid argument"));
    assert!(!err.would_block());
  }
}
