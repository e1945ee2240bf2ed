//! Safe wrapper around FFmpeg AVFrame
//!
//! Provides RAII-based memory management and read access to decoded pictures.

use crate::codec::{CodecError, Picture, PixelFormat, Plane};
use crate::ffi::{
  accessors::{
    ffframe_data_const, ffframe_get_best_effort_timestamp, ffframe_get_format,
    ffframe_get_height, ffframe_get_key_frame, ffframe_get_pkt_dts, ffframe_get_pts,
    ffframe_get_width, ffframe_linesize,
  },
  avutil::{av_frame_alloc, av_frame_copy_props, av_frame_free, av_frame_move_ref, av_frame_unref},
  AVFrame, AV_NOPTS_VALUE,
};
use std::ptr::NonNull;

/// Safe wrapper around AVFrame with RAII cleanup
pub struct FfmpegFrame {
  ptr: NonNull<AVFrame>,
}

impl FfmpegFrame {
  /// Allocate a new empty frame
  pub fn new() -> Result<Self, CodecError> {
    let ptr = unsafe { av_frame_alloc() };
    NonNull::new(ptr)
      .map(|ptr| Self { ptr })
      .ok_or(CodecError::AllocationFailed("AVFrame"))
  }

  /// Get the raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_ptr(&self) -> *const AVFrame {
    self.ptr.as_ptr()
  }

  /// Get the mutable raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVFrame {
    self.ptr.as_ptr()
  }

  /// Get the raw FFmpeg pixel format value
  #[inline]
  pub fn raw_format(&self) -> i32 {
    unsafe { ffframe_get_format(self.as_ptr()) }
  }

  /// Drop the picture data, keeping the frame allocated
  pub fn unref(&mut self) {
    unsafe { av_frame_unref(self.as_mut_ptr()) }
  }

  /// Replace this frame's content with `src`'s, leaving `src` empty
  ///
  /// Timestamps and flags of the current content are copied onto the moved
  /// picture first.
  pub fn replace_with(&mut self, src: &mut FfmpegFrame) -> Result<(), CodecError> {
    let ret = unsafe { av_frame_copy_props(src.as_mut_ptr(), self.as_ptr()) };
    crate::ffi::check_error(ret)?;
    unsafe {
      av_frame_unref(self.as_mut_ptr());
      av_frame_move_ref(self.as_mut_ptr(), src.as_mut_ptr());
    }
    Ok(())
  }

  /// Height in rows of plane `index`
  fn plane_rows(&self, index: usize) -> usize {
    let height = self.height() as usize;
    if index == 0 {
      return height;
    }
    match self.format() {
      PixelFormat::Yuv420p
      | PixelFormat::Yuvj420p
      | PixelFormat::Yuv420p10le
      | PixelFormat::Nv12
      | PixelFormat::Nv21 => height.div_ceil(2),
      _ => height,
    }
  }
}

fn timestamp(value: i64) -> Option<i64> {
  (value != AV_NOPTS_VALUE).then_some(value)
}

impl Picture for FfmpegFrame {
  #[inline]
  fn width(&self) -> u32 {
    unsafe { ffframe_get_width(self.as_ptr()).max(0) as u32 }
  }

  #[inline]
  fn height(&self) -> u32 {
    unsafe { ffframe_get_height(self.as_ptr()).max(0) as u32 }
  }

  fn format(&self) -> PixelFormat {
    PixelFormat::from_raw(self.raw_format())
  }

  #[inline]
  fn is_key_frame(&self) -> bool {
    unsafe { ffframe_get_key_frame(self.as_ptr()) != 0 }
  }

  fn pts(&self) -> Option<i64> {
    timestamp(unsafe { ffframe_get_pts(self.as_ptr()) })
  }

  fn pkt_dts(&self) -> Option<i64> {
    timestamp(unsafe { ffframe_get_pkt_dts(self.as_ptr()) })
  }

  fn best_effort_timestamp(&self) -> Option<i64> {
    timestamp(unsafe { ffframe_get_best_effort_timestamp(self.as_ptr()) })
  }

  fn plane(&self, index: usize) -> Option<Plane<'_>> {
    if index >= self.format().num_planes() {
      return None;
    }
    let data = unsafe { ffframe_data_const(self.as_ptr(), index as i32) };
    let stride = unsafe { ffframe_linesize(self.as_ptr(), index as i32) };
    // Bottom-up pictures (negative stride) are not exposed as slices
    if data.is_null() || stride <= 0 {
      return None;
    }
    let stride = stride as usize;
    let len = stride * self.plane_rows(index);
    Some(Plane {
      data: unsafe { std::slice::from_raw_parts(data, len) },
      stride,
    })
  }
}

impl Drop for FfmpegFrame {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      av_frame_free(&mut ptr);
    }
  }
}

// Frames are owned by one decoder session and never shared
unsafe impl Send for FfmpegFrame {}

impl std::fmt::Debug for FfmpegFrame {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FfmpegFrame")
      .field("width", &self.width())
      .field("height", &self.height())
      .field("format", &self.format())
      .field("pts", &self.pts())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_frame() {
    let frame = FfmpegFrame::new().unwrap();
    assert_eq!(frame.width(), 0);
    assert_eq!(frame.height(), 0);
    assert_eq!(frame.pts(), None);
    assert_eq!(frame.best_effort_timestamp(), None);
    assert!(frame.plane(0).is_none());
  }
}
