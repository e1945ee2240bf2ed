//! Out-of-band codec configuration accumulated before the first open

use super::error::{ComponentError, ComponentResult};

/// Zero bytes kept after the configuration data so that bitstream readers
/// may overread safely
///
/// Engines that copy the configuration into memory of their own, as the
/// FFmpeg engine does, take [`ExtradataBuffer::as_slice`] and pad that copy
/// themselves.
pub const EXTRADATA_PADDING: usize = 64;

/// Accumulated configuration data followed by a zero trailer
#[derive(Debug, Default)]
pub struct ExtradataBuffer {
  /// Logical bytes followed by `EXTRADATA_PADDING` zeros, empty until the
  /// first append
  data: Vec<u8>,
  frozen: bool,
}

impl ExtradataBuffer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append one configuration payload and rewrite the zero trailer
  pub fn append(&mut self, bytes: &[u8]) -> ComponentResult<()> {
    if self.frozen {
      return Err(ComponentError::ExtradataFrozen);
    }

    let len = self.len();
    self.data.truncate(len);
    self
      .data
      .try_reserve(bytes.len() + EXTRADATA_PADDING)
      .map_err(|_| ComponentError::Allocation("extradata"))?;
    self.data.extend_from_slice(bytes);
    self.data.resize(len + bytes.len() + EXTRADATA_PADDING, 0);
    Ok(())
  }

  /// Logical length, excluding the trailer
  pub fn len(&self) -> usize {
    self.data.len().saturating_sub(EXTRADATA_PADDING)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Configuration bytes without the trailer
  pub fn as_slice(&self) -> &[u8] {
    &self.data[..self.len()]
  }

  /// Configuration bytes including the trailer, for readers working on
  /// this buffer in place
  pub fn padded(&self) -> &[u8] {
    &self.data
  }

  /// Reject further appends; called when the decoder is opened
  pub fn freeze(&mut self) {
    self.frozen = true;
  }

  pub fn is_frozen(&self) -> bool {
    self.frozen
  }

  /// Drop the accumulated bytes and accept appends again
  pub fn release(&mut self) {
    self.data = Vec::new();
    self.frozen = false;
  }
}
