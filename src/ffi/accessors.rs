//! Rust declarations for C accessor functions
//!
//! These functions provide access to FFmpeg struct fields via the thin C accessor library.

use super::types::*;
use std::os::raw::{c_char, c_int};

unsafe extern "C" {
  // ========================================================================
  // AVCodec Getters
  // ========================================================================

  pub fn ffcodec_get_name(codec: *const AVCodec) -> *const c_char;
  pub fn ffcodec_get_capabilities(codec: *const AVCodec) -> c_int;

  // ========================================================================
  // AVCodecContext Setters
  // ========================================================================

  pub fn ffctx_set_codec_type(ctx: *mut AVCodecContext, codec_type: c_int);
  pub fn ffctx_set_codec_id(ctx: *mut AVCodecContext, codec_id: c_int);
  pub fn ffctx_set_width(ctx: *mut AVCodecContext, width: c_int);
  pub fn ffctx_set_height(ctx: *mut AVCodecContext, height: c_int);
  pub fn ffctx_set_workaround_bugs(ctx: *mut AVCodecContext, workaround_bugs: c_int);
  pub fn ffctx_set_error_concealment(ctx: *mut AVCodecContext, error_concealment: c_int);
  /// OR `flags2` into the context's existing flags2
  pub fn ffctx_add_flags2(ctx: *mut AVCodecContext, flags2: c_int);
  pub fn ffctx_set_thread_count(ctx: *mut AVCodecContext, thread_count: c_int);
  pub fn ffctx_set_hw_device_ctx(ctx: *mut AVCodecContext, hw_device_ctx: *mut AVBufferRef);

  /// Copy `size` bytes into freshly allocated, zero-padded extradata
  ///
  /// Returns 0 on success or AVERROR(ENOMEM).
  pub fn ffctx_set_extradata(ctx: *mut AVCodecContext, data: *const u8, size: c_int) -> c_int;

  /// Drop the context's hardware device reference, if any
  pub fn ffctx_clear_hw_device_ctx(ctx: *mut AVCodecContext);

  // ========================================================================
  // AVCodecContext Getters
  // ========================================================================

  pub fn ffctx_get_codec_id(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_width(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_flags2(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_height(ctx: *const AVCodecContext) -> c_int;

  // ========================================================================
  // AVFrame Getters
  // ========================================================================

  pub fn ffframe_get_width(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_height(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_format(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_pts(frame: *const AVFrame) -> i64;
  pub fn ffframe_get_pkt_dts(frame: *const AVFrame) -> i64;
  pub fn ffframe_get_best_effort_timestamp(frame: *const AVFrame) -> i64;
  pub fn ffframe_get_key_frame(frame: *const AVFrame) -> c_int;

  // ========================================================================
  // AVFrame Data Access
  // ========================================================================

  pub fn ffframe_data_const(frame: *const AVFrame, plane: c_int) -> *const u8;
  pub fn ffframe_linesize(frame: *const AVFrame, plane: c_int) -> c_int;

  // ========================================================================
  // AVPacket Setters
  // ========================================================================

  /// Point the packet at caller-owned data without taking a reference
  pub fn ffpkt_set_data(pkt: *mut AVPacket, data: *const u8, size: c_int);
  pub fn ffpkt_set_pts(pkt: *mut AVPacket, pts: i64);
  pub fn ffpkt_set_dts(pkt: *mut AVPacket, dts: i64);

  // ========================================================================
  // AVCodecHWConfig Getters
  // ========================================================================

  pub fn ffhwconfig_get_pix_fmt(config: *const AVCodecHWConfig) -> c_int;
  pub fn ffhwconfig_get_methods(config: *const AVCodecHWConfig) -> c_int;
  pub fn ffhwconfig_get_device_type(config: *const AVCodecHWConfig) -> c_int;
}

// ============================================================================
// Decoder Option Values
// ============================================================================

/// AV_CODEC_FLAG2_FAST: allow non-compliant speedup tricks
pub const CODEC_FLAG2_FAST: c_int = 1 << 0;

/// FF_BUG_AUTODETECT
pub const FF_BUG_AUTODETECT: c_int = 1;
