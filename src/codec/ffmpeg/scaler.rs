//! Safe wrapper around FFmpeg SwsContext
//!
//! Converts decoded pictures of any supported layout into planar 4:2:0 at
//! the negotiated output geometry, scaling with bicubic filtering.

use crate::codec::{CodecError, CodecResult, ConversionKey, I420Planes, Picture, Scale};
use crate::ffi::{
  accessors::{ffframe_data_const, ffframe_linesize},
  swscale::{sws_freeContext, sws_getContext, sws_isSupportedInput, sws_scale, SWS_BICUBIC},
  SwsContext, AV_PIX_FMT_YUV420P,
};
use std::ptr::NonNull;

use super::FfmpegFrame;

/// Safe wrapper around SwsContext bound to one [`ConversionKey`]
pub struct SwsScaler {
  ptr: NonNull<SwsContext>,
  key: ConversionKey,
}

impl SwsScaler {
  /// Create a scaler for `key`, None if libswscale refuses the conversion
  pub fn new(key: &ConversionKey) -> Option<Self> {
    let src_format = key.src_format.as_raw();
    if unsafe { sws_isSupportedInput(src_format) } == 0 {
      return None;
    }

    let ptr = unsafe {
      sws_getContext(
        key.src.width as i32,
        key.src.height as i32,
        src_format,
        key.dst.width as i32,
        key.dst.height as i32,
        AV_PIX_FMT_YUV420P,
        SWS_BICUBIC,
        std::ptr::null_mut(),
        std::ptr::null_mut(),
        std::ptr::null(),
      )
    };

    NonNull::new(ptr).map(|ptr| Self { ptr, key: *key })
  }

  pub fn key(&self) -> &ConversionKey {
    &self.key
  }
}

impl Scale<FfmpegFrame> for SwsScaler {
  fn scale(&mut self, src: &FfmpegFrame, dst: &mut I420Planes<'_>) -> CodecResult<()> {
    if src.geometry() != self.key.src
      || src.format() != self.key.src_format
      || dst.geometry() != self.key.dst
    {
      return Err(CodecError::InvalidConfig(
        "Frame dimensions don't match scaler configuration".into(),
      ));
    }

    let frame = src.as_ptr();
    let src_data: [*const u8; 4] =
      std::array::from_fn(|plane| unsafe { ffframe_data_const(frame, plane as i32) });
    let src_linesize: [i32; 4] =
      std::array::from_fn(|plane| unsafe { ffframe_linesize(frame, plane as i32) });

    let luma_stride = dst.layout.luma_stride() as i32;
    let chroma_stride = dst.layout.chroma_stride() as i32;
    let dst_data: [*mut u8; 4] = [
      dst.y.as_mut_ptr(),
      dst.u.as_mut_ptr(),
      dst.v.as_mut_ptr(),
      std::ptr::null_mut(),
    ];
    let dst_linesize: [i32; 4] = [luma_stride, chroma_stride, chroma_stride, 0];

    let ret = unsafe {
      sws_scale(
        self.ptr.as_ptr(),
        src_data.as_ptr(),
        src_linesize.as_ptr(),
        0,
        self.key.src.height as i32,
        dst_data.as_ptr(),
        dst_linesize.as_ptr(),
      )
    };
    crate::ffi::check_error(ret)?;
    Ok(())
  }
}

impl Drop for SwsScaler {
  fn drop(&mut self) {
    unsafe { sws_freeContext(self.ptr.as_ptr()) }
  }
}

// SwsContext is not thread-safe but can be moved between threads
unsafe impl Send for SwsScaler {}

impl std::fmt::Debug for SwsScaler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SwsScaler").field("key", &self.key).finish()
  }
}
