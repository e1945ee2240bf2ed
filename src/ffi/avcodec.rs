//! libavcodec function declarations
//!
//! Only the decoding half of the API is declared.

use super::types::*;
use std::os::raw::c_int;

unsafe extern "C" {
  // ========================================================================
  // Codec Discovery
  // ========================================================================

  /// Find a decoder by codec ID
  pub fn avcodec_find_decoder(id: c_int) -> *const AVCodec;

  /// Get the `index`-th hardware configuration of a codec, NULL past the end
  pub fn avcodec_get_hw_config(codec: *const AVCodec, index: c_int) -> *const AVCodecHWConfig;

  // ========================================================================
  // Codec Context Lifecycle
  // ========================================================================

  /// Allocate an AVCodecContext and set its fields to default values
  ///
  /// With a NULL codec the context is left unbound until `avcodec_open2`.
  pub fn avcodec_alloc_context3(codec: *const AVCodec) -> *mut AVCodecContext;

  /// Free the codec context and everything associated with it
  pub fn avcodec_free_context(avctx: *mut *mut AVCodecContext);

  /// Initialize the AVCodecContext to use the given AVCodec
  pub fn avcodec_open2(
    avctx: *mut AVCodecContext,
    codec: *const AVCodec,
    options: *mut *mut AVDictionary,
  ) -> c_int;

  // ========================================================================
  // Decoding (send packet, receive frame)
  // ========================================================================

  /// Supply raw packet data to the decoder
  ///
  /// # Returns
  /// * 0 on success
  /// * AVERROR(EAGAIN) - output not available, must read with receive_frame first
  /// * AVERROR_EOF - decoder has been flushed
  /// * AVERROR(EINVAL) - codec not opened
  /// * AVERROR(ENOMEM) - failed to add packet to queue
  pub fn avcodec_send_packet(avctx: *mut AVCodecContext, avpkt: *const AVPacket) -> c_int;

  /// Return decoded output data from the decoder
  ///
  /// # Returns
  /// * 0 on success
  /// * AVERROR(EAGAIN) - output not available, must send more input
  /// * AVERROR_EOF - decoder has been fully flushed
  /// * AVERROR(EINVAL) - codec not opened
  pub fn avcodec_receive_frame(avctx: *mut AVCodecContext, frame: *mut AVFrame) -> c_int;

  /// Reset the internal codec state / flush internal buffers
  pub fn avcodec_flush_buffers(avctx: *mut AVCodecContext);

  // ========================================================================
  // Packet Management
  // ========================================================================

  /// Allocate an AVPacket and set its fields to default values
  pub fn av_packet_alloc() -> *mut AVPacket;

  /// Free the packet, if the packet is reference counted, it will be unreferenced first
  pub fn av_packet_free(pkt: *mut *mut AVPacket);

  /// Wipe the packet. Unreference the buffer and reset fields to defaults
  pub fn av_packet_unref(pkt: *mut AVPacket);
}
