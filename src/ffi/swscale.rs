//! libswscale function declarations
//!
//! Only the one-shot context API is used: one context per conversion key,
//! whole pictures per call.

use super::types::*;
use std::os::raw::c_int;

unsafe extern "C" {
  /// Allocate a conversion context from one size/format to another
  ///
  /// Filters and `param` may be NULL for the defaults of `flags`.
  pub fn sws_getContext(
    srcW: c_int,
    srcH: c_int,
    srcFormat: c_int,
    dstW: c_int,
    dstH: c_int,
    dstFormat: c_int,
    flags: c_int,
    srcFilter: *mut SwsFilter,
    dstFilter: *mut SwsFilter,
    param: *const f64,
  ) -> *mut SwsContext;

  pub fn sws_freeContext(swsContext: *mut SwsContext);

  /// Convert rows `srcSliceY..srcSliceY + srcSliceH` of the source
  ///
  /// Returns the number of output rows written, negative on error.
  pub fn sws_scale(
    c: *mut SwsContext,
    srcSlice: *const *const u8,
    srcStride: *const c_int,
    srcSliceY: c_int,
    srcSliceH: c_int,
    dst: *const *mut u8,
    dstStride: *const c_int,
  ) -> c_int;

  /// Non-zero when `pix_fmt` can be a conversion source
  pub fn sws_isSupportedInput(pix_fmt: c_int) -> c_int;
}

/// Opaque SwsFilter structure (never constructed, passed as NULL)
#[repr(C)]
pub struct SwsFilter {
  _opaque: [u8; 0],
}

/// Bicubic interpolation
pub const SWS_BICUBIC: c_int = 4;
