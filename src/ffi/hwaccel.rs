//! Hardware acceleration function declarations
//!
//! Provides hardware device context management and frame download.

use super::types::*;
use std::os::raw::{c_char, c_int};

unsafe extern "C" {
  /// Create a hardware device context for the specified type
  ///
  /// # Arguments
  /// * `device_ctx` - On success, pointer to the created context
  /// * `type_` - Hardware device type
  /// * `device` - Device name (e.g., "/dev/dri/renderD128" for VAAPI, NULL for default)
  /// * `opts` - Options dictionary (can be NULL)
  /// * `flags` - Currently unused, should be 0
  pub fn av_hwdevice_ctx_create(
    device_ctx: *mut *mut AVBufferRef,
    type_: c_int,
    device: *const c_char,
    opts: *mut AVDictionary,
    flags: c_int,
  ) -> c_int;

  /// Get the string name of a hardware device type
  pub fn av_hwdevice_get_type_name(type_: c_int) -> *const c_char;

  /// Copy data between hardware and software frames
  ///
  /// If src is HW frame and dst is SW frame: download
  pub fn av_hwframe_transfer_data(dst: *mut AVFrame, src: *const AVFrame, flags: c_int) -> c_int;
}

/// Platform-specific preferred hardware device type
#[cfg(target_os = "macos")]
pub const PREFERRED_HW_DEVICE: AVHWDeviceType = AVHWDeviceType::Videotoolbox;

#[cfg(target_os = "linux")]
pub const PREFERRED_HW_DEVICE: AVHWDeviceType = AVHWDeviceType::Vaapi;

#[cfg(target_os = "windows")]
pub const PREFERRED_HW_DEVICE: AVHWDeviceType = AVHWDeviceType::D3d11va;

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
pub const PREFERRED_HW_DEVICE: AVHWDeviceType = AVHWDeviceType::None;

/// Get hardware device type name
pub fn hwdevice_type_name(device_type: AVHWDeviceType) -> &'static str {
  let name_ptr = unsafe { av_hwdevice_get_type_name(device_type.as_raw()) };
  if name_ptr.is_null() {
    return "unknown";
  }
  unsafe { std::ffi::CStr::from_ptr(name_ptr) }
    .to_str()
    .unwrap_or("unknown")
}
