//! Decoder engine contract
//!
//! The component drives any decoding library that can express itself through
//! these traits: a context that is configured, opened once, fed packets and
//! drained of frames. The FFmpeg implementation lives in `codec::ffmpeg`;
//! `testing::ScriptedEngine` is a deterministic in-memory implementation.

use super::{CodecId, Geometry, Packet, PixelFormat, Scale};

/// Failure reported by a decoder engine call
///
/// `Again` is the "needs more input" sentinel of the two-phase API and is
/// never an error from the component's point of view.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
  #[error("resource temporarily unavailable")]
  Again,

  #[error("end of stream")]
  Eof,

  #[error("engine error {code}: {message}")]
  Failed { code: i32, message: String },
}

impl EngineError {
  pub fn failed(code: i32, message: impl Into<String>) -> Self {
    Self::Failed {
      code,
      message: message.into(),
    }
  }

  /// Check if this is the needs-more-input sentinel
  #[inline]
  pub fn is_again(&self) -> bool {
    matches!(self, Self::Again)
  }

  /// Check if this error indicates "would block" (Again or Eof)
  #[inline]
  pub fn would_block(&self) -> bool {
    matches!(self, Self::Again | Self::Eof)
  }
}

/// Capability flags of a resolved decoder implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderCapabilities {
  /// The decoder may hold frames back and must be drained with empty packets
  pub delay: bool,
}

/// A decoder implementation resolved for a codec identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderDescriptor {
  pub codec: CodecId,
  pub name: String,
  pub capabilities: DecoderCapabilities,
}

/// Baseline robustness options applied before opening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
  /// Work around known encoder bugs
  pub workaround_bugs: bool,
  /// Error concealment strategy bitmask (guess motion vectors | deblock)
  pub error_concealment: i32,
  /// Allow non-compliant speedup tricks
  pub fast: bool,
  /// Decoder threads, 0 lets the engine decide
  pub thread_count: u32,
}

impl Default for OpenOptions {
  fn default() -> Self {
    Self {
      workaround_bugs: true,
      error_concealment: 3,
      fast: false,
      thread_count: 0,
    }
  }
}

/// One plane of a decoded picture
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
  pub data: &'a [u8],
  /// Bytes between the starts of two consecutive rows
  pub stride: usize,
}

impl<'a> Plane<'a> {
  /// Get one row of `width` bytes
  ///
  /// Returns None if the row lies outside the plane data
  pub fn row(&self, y: usize, width: usize) -> Option<&'a [u8]> {
    let start = y.checked_mul(self.stride)?;
    self.data.get(start..start.checked_add(width)?)
  }
}

/// A decoded picture as seen by the conversion and timestamp logic
pub trait Picture {
  fn width(&self) -> u32;

  fn height(&self) -> u32;

  fn format(&self) -> PixelFormat;

  fn is_key_frame(&self) -> bool;

  /// Presentation timestamp, None when unknown
  fn pts(&self) -> Option<i64>;

  /// Decode timestamp of the packet that produced this picture
  fn pkt_dts(&self) -> Option<i64>;

  /// Engine-reconciled presentation timestamp, None when unknown
  fn best_effort_timestamp(&self) -> Option<i64>;

  /// Whether the engine computes best-effort timestamps at all
  fn has_best_effort_timestamp(&self) -> bool {
    true
  }

  /// Access plane `index`, None if the format has no such plane
  fn plane(&self, index: usize) -> Option<Plane<'_>>;

  fn geometry(&self) -> Geometry {
    Geometry::new(self.width(), self.height())
  }
}

/// A decoding library able to create decoder contexts
pub trait DecoderEngine {
  type Context: DecoderContext;

  /// Conversion context producing planar 4:2:0 from this engine's frames
  type Scaler: Scale<<Self::Context as DecoderContext>::Frame>;

  /// Allocate a fresh, unconfigured context, None on allocation failure
  fn alloc_context(&mut self) -> Option<Self::Context>;

  /// Resolve the decoder implementation for a codec identity
  fn find_decoder(&self, codec: CodecId) -> Option<DecoderDescriptor>;

  /// Build a conversion context for the given key, None if unsupported
  fn create_scaler(&mut self, key: &super::ConversionKey) -> Option<Self::Scaler>;
}

/// One decoder instance
///
/// Frame and packet holders are allocated by the context but owned by the
/// caller, which keeps them for the lifetime of one open session.
pub trait DecoderContext {
  type Frame: Picture;
  type PacketHolder;

  /// Set media type video, codec identity and declared geometry
  fn configure(&mut self, codec: CodecId, geometry: Geometry);

  /// Declared geometry; decoders may update it once the stream is parsed
  fn geometry(&self) -> Geometry;

  /// Open the context with the resolved decoder
  fn open(
    &mut self,
    decoder: &DecoderDescriptor,
    options: &OpenOptions,
    extradata: &[u8],
  ) -> Result<(), EngineError>;

  fn alloc_frame(&mut self) -> Option<Self::Frame>;

  fn alloc_packet(&mut self) -> Option<Self::PacketHolder>;

  /// Submit one packet; an empty packet signals end of stream
  fn send_packet(
    &mut self,
    holder: &mut Self::PacketHolder,
    packet: &Packet<'_>,
  ) -> Result<(), EngineError>;

  /// Retrieve one decoded frame into `frame`
  fn receive_frame(&mut self, frame: &mut Self::Frame) -> Result<(), EngineError>;

  /// Drop every buffered packet and frame
  fn flush_buffers(&mut self);

  /// Close the codec; the context is dropped afterwards
  fn close(&mut self);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_engine_error_classification() {
    assert!(EngineError::Again.is_again());
    assert!(EngineError::Again.would_block());
    assert!(EngineError::Eof.would_block());
    assert!(!EngineError::Eof.is_again());
    assert!(!EngineError::failed(-22, "Invalid argument").would_block());
  }

  #[test]
  fn test_plane_row_bounds() {
    let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
    let plane = Plane {
      data: &data,
      stride: 4,
    };
    assert_eq!(plane.row(1, 3), Some(&data[4..7]));
    assert_eq!(plane.row(2, 1), None);
  }
}
