//! Host-owned buffer descriptors
//!
//! Buffers are plain values. Taking one out of a port queue moves it into the
//! component; handing it to a completion callback moves it back. Neither type
//! is `Clone`, so a buffer cannot be completed twice.

bitflags::bitflags! {
  /// Buffer flag bits exchanged with the host
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct BufferFlags: u32 {
    /// Last buffer of the stream
    const EOS = 0x0000_0001;
    /// Output picture is a keyframe
    const SYNC_FRAME = 0x0000_0020;
    /// Input carries codec configuration data, not a picture
    const CODEC_CONFIG = 0x0000_0080;
  }
}

/// Encoded data handed to the input port
#[derive(Debug)]
pub struct InputBuffer {
  /// Host identifier, echoed back on completion
  pub id: u64,
  pub data: Vec<u8>,
  pub offset: usize,
  pub filled_len: usize,
  pub flags: BufferFlags,
  pub timestamp: i64,
}

impl InputBuffer {
  /// Wrap a payload that fills the whole storage
  pub fn new(id: u64, data: Vec<u8>, timestamp: i64) -> Self {
    let filled_len = data.len();
    Self {
      id,
      data,
      offset: 0,
      filled_len,
      flags: BufferFlags::empty(),
      timestamp,
    }
  }

  /// Build a codec configuration buffer
  pub fn codec_config(id: u64, data: Vec<u8>) -> Self {
    Self::new(id, data, 0).with_flags(BufferFlags::CODEC_CONFIG)
  }

  /// Build an empty end-of-stream buffer
  pub fn eos(id: u64) -> Self {
    Self::new(id, Vec::new(), 0).with_flags(BufferFlags::EOS)
  }

  pub fn with_flags(mut self, flags: BufferFlags) -> Self {
    self.flags |= flags;
    self
  }

  /// Get the valid payload bytes
  ///
  /// An offset/length pair reaching past the storage yields the bytes that
  /// exist.
  pub fn payload(&self) -> &[u8] {
    let start = self.offset.min(self.data.len());
    let end = self.offset.saturating_add(self.filled_len).min(self.data.len());
    &self.data[start..end]
  }

  #[inline]
  pub fn is_eos(&self) -> bool {
    self.flags.contains(BufferFlags::EOS)
  }

  #[inline]
  pub fn is_codec_config(&self) -> bool {
    self.flags.contains(BufferFlags::CODEC_CONFIG)
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.payload().is_empty()
  }
}

/// Destination storage handed to the output port
#[derive(Debug)]
pub struct OutputBuffer {
  /// Host identifier, echoed back on completion
  pub id: u64,
  pub data: Vec<u8>,
  pub offset: usize,
  pub filled_len: usize,
  pub flags: BufferFlags,
  pub timestamp: i64,
}

impl OutputBuffer {
  /// Wrap empty destination storage of `capacity` bytes
  pub fn new(id: u64, capacity: usize) -> Self {
    Self {
      id,
      data: vec![0; capacity],
      offset: 0,
      filled_len: 0,
      flags: BufferFlags::empty(),
      timestamp: 0,
    }
  }

  /// Get the filled bytes
  pub fn filled(&self) -> &[u8] {
    let end = self.offset.saturating_add(self.filled_len).min(self.data.len());
    &self.data[self.offset.min(end)..end]
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.data.len()
  }

  #[inline]
  pub fn is_eos(&self) -> bool {
    self.flags.contains(BufferFlags::EOS)
  }

  #[inline]
  pub fn is_sync_frame(&self) -> bool {
    self.flags.contains(BufferFlags::SYNC_FRAME)
  }

  /// Clear the result fields before the buffer is filled
  pub(crate) fn reset_result(&mut self) {
    self.offset = 0;
    self.filled_len = 0;
    self.flags = BufferFlags::empty();
    self.timestamp = 0;
  }
}
