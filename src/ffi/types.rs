//! Core FFmpeg type definitions
//!
//! All FFmpeg structs are opaque (zero-sized) to avoid version-specific layout dependencies.
//! Field access is done via the thin C accessor library in accessors.c

use std::marker::PhantomData;
use std::os::raw::c_int;

// ============================================================================
// Opaque FFmpeg Types
// ============================================================================

/// Opaque AVCodec structure (codec implementation descriptor)
#[repr(C)]
pub struct AVCodec {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVCodecContext structure (decoder instance)
#[repr(C)]
pub struct AVCodecContext {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVFrame structure (uncompressed picture)
#[repr(C)]
pub struct AVFrame {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVPacket structure (compressed data)
#[repr(C)]
pub struct AVPacket {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVBufferRef structure (reference-counted buffer)
#[repr(C)]
pub struct AVBufferRef {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque SwsContext structure (software scaler context)
#[repr(C)]
pub struct SwsContext {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVDictionary structure (key-value options)
#[repr(C)]
pub struct AVDictionary {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVCodecHWConfig structure (one hardware path of a decoder)
#[repr(C)]
pub struct AVCodecHWConfig {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

// ============================================================================
// Hardware Device Types
// ============================================================================

/// Hardware acceleration device types
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVHWDeviceType {
  None = 0,
  Vdpau = 1,
  Cuda = 2,
  Vaapi = 3,
  Dxva2 = 4,
  Qsv = 5,
  Videotoolbox = 6,
  D3d11va = 7,
  Drm = 8,
  Opencl = 9,
  Mediacodec = 10,
  Vulkan = 11,
}

impl AVHWDeviceType {
  /// Get the raw FFmpeg hardware device type value
  pub fn as_raw(&self) -> c_int {
    *self as c_int
  }
}

// ============================================================================
// Constants
// ============================================================================

/// No timestamp value
pub const AV_NOPTS_VALUE: i64 = 0x8000000000000000u64 as i64;

/// Zero bytes FFmpeg requires after bitstream buffers it reads
pub const AV_INPUT_BUFFER_PADDING_SIZE: usize = 64;

/// Planar YUV 4:2:0, the output format of the component
pub const AV_PIX_FMT_YUV420P: c_int = 0;

/// AVMEDIA_TYPE_VIDEO
pub const AVMEDIA_TYPE_VIDEO: c_int = 0;

/// Decoder capability flags (AVCodec.capabilities)
pub mod codec_cap {
  use std::os::raw::c_int;

  /// Decoder has a delay and needs to be fed with empty packets at the end
  pub const DELAY: c_int = 1 << 5;
}

/// Hardware config methods (AVCodecHWConfig.methods)
pub mod hw_config_method {
  use std::os::raw::c_int;

  /// The decoder accepts a device through AVCodecContext.hw_device_ctx
  pub const HW_DEVICE_CTX: c_int = 0x01;
}
