//! Safe wrapper around FFmpeg AVPacket
//!
//! One packet is allocated per open session and re-pointed at each input
//! payload before submission.

use crate::codec::{CodecError, Packet};
use crate::ffi::{
  accessors::{ffpkt_set_data, ffpkt_set_dts, ffpkt_set_pts},
  avcodec::{av_packet_alloc, av_packet_free, av_packet_unref},
  AVPacket, AV_NOPTS_VALUE,
};
use std::ptr::NonNull;

/// Safe wrapper around AVPacket with RAII cleanup
pub struct FfmpegPacket {
  ptr: NonNull<AVPacket>,
}

impl FfmpegPacket {
  /// Allocate a new empty packet
  pub fn new() -> Result<Self, CodecError> {
    let ptr = unsafe { av_packet_alloc() };
    NonNull::new(ptr)
      .map(|ptr| Self { ptr })
      .ok_or(CodecError::AllocationFailed("AVPacket"))
  }

  /// Get the raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_ptr(&self) -> *const AVPacket {
    self.ptr.as_ptr()
  }

  /// Get the mutable raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVPacket {
    self.ptr.as_ptr()
  }

  /// Point the packet at `packet`'s payload and timestamps
  ///
  /// The payload is borrowed, not referenced; the packet must be cleared
  /// before the payload goes away.
  pub fn load(&mut self, packet: &Packet<'_>) {
    let data = packet.data();
    let ptr = if data.is_empty() {
      std::ptr::null()
    } else {
      data.as_ptr()
    };
    let size = i32::try_from(data.len()).unwrap_or(i32::MAX);
    unsafe {
      ffpkt_set_data(self.as_mut_ptr(), ptr, size);
      ffpkt_set_pts(self.as_mut_ptr(), packet.pts().unwrap_or(AV_NOPTS_VALUE));
      ffpkt_set_dts(self.as_mut_ptr(), packet.dts().unwrap_or(AV_NOPTS_VALUE));
    }
  }

  /// Detach the borrowed payload and reset fields to defaults
  pub fn clear(&mut self) {
    unsafe {
      ffpkt_set_data(self.as_mut_ptr(), std::ptr::null(), 0);
      av_packet_unref(self.as_mut_ptr());
    }
  }
}

impl Drop for FfmpegPacket {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      av_packet_free(&mut ptr);
    }
  }
}

// Packets are owned by one decoder session and never shared
unsafe impl Send for FfmpegPacket {}

impl std::fmt::Debug for FfmpegPacket {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FfmpegPacket").finish_non_exhaustive()
  }
}
