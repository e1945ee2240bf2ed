//! Safe wrapper around FFmpeg AVCodecContext
//!
//! Provides the decoding half of the send/receive API with RAII cleanup.

use crate::codec::{
  CodecId, DecoderContext, DecoderDescriptor, EngineError, Geometry, OpenOptions, Packet,
};
use crate::ffi::{
  self,
  accessors::{
    ffctx_clear_hw_device_ctx, ffctx_get_codec_id, ffctx_get_flags2, ffctx_get_height, ffctx_get_width,
    ffctx_set_codec_id, ffctx_set_codec_type, ffctx_set_error_concealment, ffctx_set_extradata,
    ffctx_add_flags2, ffctx_set_height, ffctx_set_hw_device_ctx, ffctx_set_thread_count,
    ffctx_set_width, ffctx_set_workaround_bugs, CODEC_FLAG2_FAST, FF_BUG_AUTODETECT,
  },
  avcodec::{
    avcodec_alloc_context3, avcodec_find_decoder, avcodec_flush_buffers, avcodec_free_context,
    avcodec_open2, avcodec_receive_frame, avcodec_send_packet,
  },
  error::AVERROR_DECODER_NOT_FOUND,
  AVBufferRef, AVCodecContext, AVMEDIA_TYPE_VIDEO,
};
use std::ptr::NonNull;

use super::{FfmpegFrame, FfmpegPacket};

/// Safe wrapper around a decoding AVCodecContext
pub struct FfmpegContext {
  ptr: NonNull<AVCodecContext>,
  opened: bool,
}

impl FfmpegContext {
  /// Allocate an unbound context; the decoder is chosen at open
  pub fn alloc() -> Option<Self> {
    let ptr = unsafe { avcodec_alloc_context3(std::ptr::null()) };
    NonNull::new(ptr).map(|ptr| Self { ptr, opened: false })
  }

  /// Get raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_ptr(&self) -> *const AVCodecContext {
    self.ptr.as_ptr()
  }

  /// Get mutable raw pointer
  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVCodecContext {
    self.ptr.as_ptr()
  }

  /// Get the configured codec identity
  pub fn codec_id(&self) -> i32 {
    unsafe { ffctx_get_codec_id(self.as_ptr()) }
  }

  /// Attach a hardware device; the context takes its own reference
  pub fn set_hw_device(&mut self, device: *mut AVBufferRef) {
    unsafe { ffctx_set_hw_device_ctx(self.as_mut_ptr(), device) }
  }

  /// Drop the context's hardware device reference
  pub fn clear_hw_device(&mut self) {
    unsafe { ffctx_clear_hw_device_ctx(self.as_mut_ptr()) }
  }

  #[inline]
  pub fn is_open(&self) -> bool {
    self.opened
  }

  /// Get the decoder flags2 bitmask
  pub fn flags2(&self) -> i32 {
    unsafe { ffctx_get_flags2(self.as_ptr()) }
  }

  /// Apply robustness options; flags2 bits are added to the defaults
  fn apply_options(&mut self, options: &OpenOptions) {
    let ctx = self.as_mut_ptr();
    unsafe {
      ffctx_set_workaround_bugs(ctx, if options.workaround_bugs { FF_BUG_AUTODETECT } else { 0 });
      ffctx_set_error_concealment(ctx, options.error_concealment);
      if options.fast {
        ffctx_add_flags2(ctx, CODEC_FLAG2_FAST);
      }
      ffctx_set_thread_count(ctx, options.thread_count as i32);
    }
  }
}

impl DecoderContext for FfmpegContext {
  type Frame = FfmpegFrame;
  type PacketHolder = FfmpegPacket;

  fn configure(&mut self, codec: CodecId, geometry: Geometry) {
    let ctx = self.as_mut_ptr();
    unsafe {
      ffctx_set_codec_type(ctx, AVMEDIA_TYPE_VIDEO);
      ffctx_set_codec_id(ctx, codec.as_raw());
      ffctx_set_width(ctx, geometry.width as i32);
      ffctx_set_height(ctx, geometry.height as i32);
    }
  }

  fn geometry(&self) -> Geometry {
    let width = unsafe { ffctx_get_width(self.as_ptr()) };
    let height = unsafe { ffctx_get_height(self.as_ptr()) };
    Geometry::new(width.max(0) as u32, height.max(0) as u32)
  }

  fn open(
    &mut self,
    decoder: &DecoderDescriptor,
    options: &OpenOptions,
    extradata: &[u8],
  ) -> Result<(), EngineError> {
    if self.opened {
      return Ok(());
    }

    let codec = unsafe { avcodec_find_decoder(decoder.codec.as_raw()) };
    if codec.is_null() {
      return Err(EngineError::failed(
        AVERROR_DECODER_NOT_FOUND,
        format!("no {} decoder linked", decoder.codec),
      ));
    }

    let ctx = self.as_mut_ptr();
    unsafe {
      // Extradata is copied into FFmpeg-owned memory with its own padding
      let size = i32::try_from(extradata.len()).unwrap_or(i32::MAX);
      let ptr = if extradata.is_empty() {
        std::ptr::null()
      } else {
        extradata.as_ptr()
      };
      ffi::check_error(ffctx_set_extradata(ctx, ptr, size))?;
    }
    self.apply_options(options);

    let ret = unsafe { avcodec_open2(ctx, codec, std::ptr::null_mut()) };
    ffi::check_error(ret)?;
    self.opened = true;
    tracing::debug!(
      target: "softvdec",
      "avcodec_open2 succeeded for {} ({} bytes extradata)",
      decoder.name,
      extradata.len()
    );
    Ok(())
  }

  fn alloc_frame(&mut self) -> Option<Self::Frame> {
    FfmpegFrame::new().ok()
  }

  fn alloc_packet(&mut self) -> Option<Self::PacketHolder> {
    FfmpegPacket::new().ok()
  }

  fn send_packet(
    &mut self,
    holder: &mut Self::PacketHolder,
    packet: &Packet<'_>,
  ) -> Result<(), EngineError> {
    holder.load(packet);
    let ret = unsafe { avcodec_send_packet(self.as_mut_ptr(), holder.as_ptr()) };
    holder.clear();
    ffi::check_engine(ret)
  }

  fn receive_frame(&mut self, frame: &mut Self::Frame) -> Result<(), EngineError> {
    let ret = unsafe { avcodec_receive_frame(self.as_mut_ptr(), frame.as_mut_ptr()) };
    ffi::check_engine(ret)
  }

  fn flush_buffers(&mut self) {
    if self.opened {
      unsafe { avcodec_flush_buffers(self.as_mut_ptr()) }
    }
  }

  fn close(&mut self) {
    // The codec is released with the context in Drop
    self.opened = false;
  }
}

impl Drop for FfmpegContext {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      avcodec_free_context(&mut ptr);
    }
  }
}

// FfmpegContext is NOT Sync - FFmpeg contexts are not thread-safe
unsafe impl Send for FfmpegContext {}

impl std::fmt::Debug for FfmpegContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FfmpegContext")
      .field("codec_id", &self.codec_id())
      .field("geometry", &self.geometry())
      .field("opened", &self.opened)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// AV_CODEC_FLAG2_IGNORE_CROP, standing in for a pre-set default
  const FLAG2_IGNORE_CROP: i32 = 1 << 16;

  #[test]
  fn test_fast_option_keeps_existing_flags2() {
    let mut ctx = FfmpegContext::alloc().unwrap();
    unsafe { ffctx_add_flags2(ctx.as_mut_ptr(), FLAG2_IGNORE_CROP) };

    let options = OpenOptions {
      fast: true,
      ..OpenOptions::default()
    };
    ctx.apply_options(&options);

    assert_eq!(ctx.flags2() & FLAG2_IGNORE_CROP, FLAG2_IGNORE_CROP);
    assert_eq!(ctx.flags2() & CODEC_FLAG2_FAST, CODEC_FLAG2_FAST);
  }

  #[test]
  fn test_slow_option_leaves_flags2_alone() {
    let mut ctx = FfmpegContext::alloc().unwrap();
    let before = ctx.flags2();
    ctx.apply_options(&OpenOptions::default());
    assert_eq!(ctx.flags2(), before);
  }
}
