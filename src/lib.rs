#![deny(clippy::all)]

//! Buffer-exchange software video decoder
//!
//! This crate bridges a port-based buffer protocol to a compressed-video
//! decoding engine, normalizing every decoded picture to planar I420.
//! The production engine is FFmpeg (cargo feature `ffmpeg`).

// FFmpeg C bindings (hand-written, no bindgen)
#[cfg(feature = "ffmpeg")]
pub mod ffi;

// Engine-neutral codec types and the FFmpeg engine
pub mod codec;

// Decoder component: ports, state machine, drive loop
pub mod component;

pub mod config;

// Scripted engine for driving the component without a native decoder
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use codec::{CodecError, CodecId, Geometry, PixelFormat};
pub use component::{
  BufferFlags, BufferPorts, ComponentError, ComponentResult, EosStatus, HostEvent, InputBuffer,
  OutputBuffer, PortIndex, PortQueues, RvFormat, SoftVideoDecoder, VideoParam, VideoParamIndex,
  VideoParamValue, WmvFormat,
};
pub use config::{DecoderConfig, TimestampSource};
