//! Engine-neutral codec types
//!
//! The decode core never talks to a native library directly. It drives a
//! [`DecoderEngine`] through the two-phase "send packet / receive frame"
//! contract declared in [`engine`], and normalizes pictures through the
//! conversion cache in [`scaler`].

pub mod engine;
pub mod hwaccel;
pub mod packet;
pub mod scaler;
pub mod software;

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

pub use engine::{
  DecoderCapabilities, DecoderContext, DecoderDescriptor, DecoderEngine, EngineError, OpenOptions,
  Picture, Plane,
};
pub use hwaccel::{HwAccel, NoHwAccel};
pub use packet::Packet;
pub use scaler::{ConversionCache, ConversionKey, I420Layout, I420Planes, Scale};
pub use software::SoftwareScaler;

/// Compressed video codecs the component can be configured for
///
/// Discriminants are the FFmpeg `AVCodecID` values so that the FFmpeg engine
/// can pass them through unchanged.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum CodecId {
  #[default]
  None = 0,
  Mpeg2Video = 2,
  H263 = 4,
  Rv20 = 6,
  Mpeg4 = 12,
  Wmv1 = 17,
  Wmv2 = 18,
  Flv1 = 21,
  H264 = 27,
  Rv30 = 68,
  Rv40 = 69,
  Vc1 = 70,
  Wmv3 = 71,
  Vp8 = 139,
  Vp9 = 167,
  Hevc = 173,
  Av1 = 226,
}

impl CodecId {
  /// Get the raw FFmpeg codec ID value
  pub fn as_raw(&self) -> i32 {
    *self as i32
  }

  /// Map a raw FFmpeg codec ID back to a known codec
  pub fn from_raw(raw: i32) -> Option<Self> {
    let id = match raw {
      0 => Self::None,
      2 => Self::Mpeg2Video,
      4 => Self::H263,
      6 => Self::Rv20,
      12 => Self::Mpeg4,
      17 => Self::Wmv1,
      18 => Self::Wmv2,
      21 => Self::Flv1,
      27 => Self::H264,
      68 => Self::Rv30,
      69 => Self::Rv40,
      70 => Self::Vc1,
      71 => Self::Wmv3,
      139 => Self::Vp8,
      167 => Self::Vp9,
      173 => Self::Hevc,
      226 => Self::Av1,
      _ => return None,
    };
    Some(id)
  }

  /// Short codec name, as used in log lines
  pub fn name(&self) -> &'static str {
    match self {
      Self::None => "none",
      Self::Mpeg2Video => "mpeg2video",
      Self::H263 => "h263",
      Self::Rv20 => "rv20",
      Self::Mpeg4 => "mpeg4",
      Self::Wmv1 => "wmv1",
      Self::Wmv2 => "wmv2",
      Self::Flv1 => "flv1",
      Self::H264 => "h264",
      Self::Rv30 => "rv30",
      Self::Rv40 => "rv40",
      Self::Vc1 => "vc1",
      Self::Wmv3 => "wmv3",
      Self::Vp8 => "vp8",
      Self::Vp9 => "vp9",
      Self::Hevc => "hevc",
      Self::Av1 => "av1",
    }
  }
}

impl std::fmt::Display for CodecId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// Native pixel formats a decoder may produce
///
/// Discriminants follow FFmpeg's `AVPixelFormat`. Formats the component has
/// no name for are carried as [`PixelFormat::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
  Yuv420p,
  Yuvj420p,
  Yuv422p,
  Yuvj422p,
  Yuv444p,
  Yuvj444p,
  Nv12,
  Nv21,
  Gray8,
  Rgb24,
  Bgr24,
  Rgba,
  Bgra,
  Yuv420p10le,
  Other(i32),
}

impl PixelFormat {
  pub fn from_raw(raw: i32) -> Self {
    match raw {
      0 => Self::Yuv420p,
      2 => Self::Rgb24,
      3 => Self::Bgr24,
      4 => Self::Yuv422p,
      5 => Self::Yuv444p,
      8 => Self::Gray8,
      12 => Self::Yuvj420p,
      13 => Self::Yuvj422p,
      14 => Self::Yuvj444p,
      23 => Self::Nv12,
      24 => Self::Nv21,
      26 => Self::Rgba,
      28 => Self::Bgra,
      64 => Self::Yuv420p10le,
      other => Self::Other(other),
    }
  }

  pub fn as_raw(&self) -> i32 {
    match self {
      Self::Yuv420p => 0,
      Self::Rgb24 => 2,
      Self::Bgr24 => 3,
      Self::Yuv422p => 4,
      Self::Yuv444p => 5,
      Self::Gray8 => 8,
      Self::Yuvj420p => 12,
      Self::Yuvj422p => 13,
      Self::Yuvj444p => 14,
      Self::Nv12 => 23,
      Self::Nv21 => 24,
      Self::Rgba => 26,
      Self::Bgra => 28,
      Self::Yuv420p10le => 64,
      Self::Other(raw) => *raw,
    }
  }

  /// Number of planes for this pixel format
  pub fn num_planes(&self) -> usize {
    match self {
      Self::Yuv420p
      | Self::Yuvj420p
      | Self::Yuv422p
      | Self::Yuvj422p
      | Self::Yuv444p
      | Self::Yuvj444p
      | Self::Yuv420p10le => 3,
      Self::Nv12 | Self::Nv21 => 2,
      Self::Gray8 | Self::Rgb24 | Self::Bgr24 | Self::Rgba | Self::Bgra => 1,
      Self::Other(_) => 0,
    }
  }
}

/// Picture dimensions in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Geometry {
  pub width: u32,
  pub height: u32,
}

impl Geometry {
  pub const fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }

  /// Byte size of one picture in the fixed planar 4:2:0 output layout
  pub fn i420_size(&self) -> usize {
    I420Layout::new(*self).total_size()
  }
}

impl std::fmt::Display for Geometry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}x{}", self.width, self.height)
  }
}

/// Codec error type
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
  #[cfg(feature = "ffmpeg")]
  #[error("FFmpeg error: {0}")]
  Ffmpeg(#[from] crate::ffi::FFmpegError),

  #[error("Engine error: {0}")]
  Engine(#[from] EngineError),

  #[error("Failed to allocate {0}")]
  AllocationFailed(&'static str),

  #[error("Unsupported pixel format: {0:?}")]
  UnsupportedPixelFormat(PixelFormat),

  #[error("Invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("Destination buffer too small: need {needed} bytes, have {available}")]
  BufferTooSmall { needed: usize, available: usize },

  #[error("Hardware acceleration error: {0}")]
  HardwareError(String),
}

pub type CodecResult<T> = Result<T, CodecError>;
