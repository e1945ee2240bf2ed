//! Hand-written FFmpeg C bindings (no bindgen)
//!
//! Minimal bindings for video decoding and picture conversion.
//! All FFmpeg structs are opaque - we access fields via the thin C accessor library.

pub mod accessors;
pub mod avcodec;
pub mod avutil;
pub mod error;
pub mod hwaccel;
pub mod swscale;
pub mod types;

// Static zlib for libavcodec's inflate-based decoders
use libz_sys as _;

pub use error::{check_engine, check_error, FFmpegError, FFmpegResult};
pub use types::*;
