//! FFmpeg decoding engine
//!
//! Implements the engine contract on top of libavcodec, with libswscale for
//! picture conversion. Device-backed hardware decoding is available with the
//! `hwaccel` feature.

mod context;
mod frame;
#[cfg(feature = "hwaccel")]
mod hwdevice;
mod packet;
mod scaler;

pub use context::FfmpegContext;
pub use frame::FfmpegFrame;
#[cfg(feature = "hwaccel")]
pub use hwdevice::{HwDevice, HwDeviceAccel};
pub use packet::FfmpegPacket;
pub use scaler::SwsScaler;

use std::ffi::CStr;

use crate::codec::{CodecId, ConversionKey, DecoderCapabilities, DecoderDescriptor, DecoderEngine};
use crate::component::{BufferPorts, ComponentResult, SoftVideoDecoder};
use crate::config::DecoderConfig;
use crate::ffi::{
  accessors::{ffcodec_get_capabilities, ffcodec_get_name},
  avcodec::avcodec_find_decoder,
  avutil::{av_log_set_level, log_level},
  codec_cap,
};

/// Decoder engine backed by the linked FFmpeg libraries
#[derive(Debug, Default)]
pub struct FfmpegEngine {
  _private: (),
}

impl FfmpegEngine {
  pub fn new() -> Self {
    Self::default()
  }

  /// Restrict FFmpeg's own stderr logging to errors
  pub fn quiet(self) -> Self {
    unsafe { av_log_set_level(log_level::ERROR) };
    self
  }
}

impl DecoderEngine for FfmpegEngine {
  type Context = FfmpegContext;
  type Scaler = SwsScaler;

  fn alloc_context(&mut self) -> Option<FfmpegContext> {
    FfmpegContext::alloc()
  }

  fn find_decoder(&self, codec: CodecId) -> Option<DecoderDescriptor> {
    if codec == CodecId::None {
      return None;
    }
    let decoder = unsafe { avcodec_find_decoder(codec.as_raw()) };
    if decoder.is_null() {
      return None;
    }

    let name_ptr = unsafe { ffcodec_get_name(decoder) };
    let name = if name_ptr.is_null() {
      codec.name().to_string()
    } else {
      unsafe { CStr::from_ptr(name_ptr) }
        .to_string_lossy()
        .into_owned()
    };
    let capabilities = unsafe { ffcodec_get_capabilities(decoder) };

    Some(DecoderDescriptor {
      codec,
      name,
      capabilities: DecoderCapabilities {
        delay: capabilities & codec_cap::DELAY != 0,
      },
    })
  }

  fn create_scaler(&mut self, key: &ConversionKey) -> Option<SwsScaler> {
    let scaler = SwsScaler::new(key);
    if scaler.is_none() {
      tracing::warn!(
        target: "softvdec",
        "libswscale cannot convert {:?} {} to I420 {}",
        key.src_format,
        key.src,
        key.dst
      );
    }
    scaler
  }
}

/// Decoder component running on FFmpeg
pub type FfmpegDecoder<P> = SoftVideoDecoder<FfmpegEngine, P>;

/// Create an FFmpeg-backed decoder component on `ports`
///
/// With the `hwaccel` feature the platform's preferred device is tried
/// first; decoding falls back to software when it cannot be attached.
pub fn decoder<P: BufferPorts>(ports: P, config: DecoderConfig) -> ComponentResult<FfmpegDecoder<P>> {
  let engine = FfmpegEngine::new().quiet();

  #[cfg(feature = "hwaccel")]
  {
    SoftVideoDecoder::with_hwaccel(engine, ports, config, Box::new(HwDeviceAccel::preferred()))
  }

  #[cfg(not(feature = "hwaccel"))]
  {
    SoftVideoDecoder::new(engine, ports, config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_no_decoder_for_none() {
    let engine = FfmpegEngine::new();
    assert!(engine.find_decoder(CodecId::None).is_none());
  }

  #[test]
  fn test_alloc_context_is_unopened() {
    let mut engine = FfmpegEngine::new();
    let ctx = engine.alloc_context().unwrap();
    assert!(!ctx.is_open());
  }
}
