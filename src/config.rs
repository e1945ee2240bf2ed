//! Construction-time decoder configuration

use crate::codec::{CodecId, Geometry};

/// Environment variable enabling non-compliant speedup tricks
pub const ENV_FAST: &str = "SOFTVDEC_FAST";

/// Environment variable selecting the output timestamp source
pub const ENV_REORDER_PTS: &str = "SOFTVDEC_REORDER_PTS";

/// Which decoded-frame timestamp is copied to the output buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampSource {
  /// Decoder-reconciled best-effort timestamp, presentation timestamp when
  /// the engine does not compute one
  #[default]
  Auto,
  /// Raw presentation timestamp of the frame
  Presentation,
  /// Decode timestamp of the packet that produced the frame
  Decode,
}

impl TimestampSource {
  /// Parse `auto`/`pts`/`dts` or the numeric reorder flag `-1`/`1`/`0`
  pub fn parse(value: &str) -> Option<Self> {
    match value.trim().to_ascii_lowercase().as_str() {
      "auto" | "-1" => Some(Self::Auto),
      "pts" | "1" => Some(Self::Presentation),
      "dts" | "0" => Some(Self::Decode),
      _ => None,
    }
  }
}

/// Decoder configuration
#[derive(Debug, Clone)]
pub struct DecoderConfig {
  /// Codec the context is created for
  pub codec: CodecId,
  /// Initially negotiated geometry of both ports
  pub geometry: Geometry,
  /// Allow non-compliant speedups in the decoder
  pub fast_decode: bool,
  /// Output timestamp selection
  pub timestamp_source: TimestampSource,
  /// Return configuration buffers without accumulating them
  pub ignore_codec_config: bool,
  /// Number of threads (0 for auto)
  pub thread_count: u32,
}

impl Default for DecoderConfig {
  fn default() -> Self {
    Self {
      codec: CodecId::H264,
      geometry: Geometry::new(352, 288),
      fast_decode: false,
      timestamp_source: TimestampSource::Auto,
      ignore_codec_config: false,
      thread_count: 0,
    }
  }
}

impl DecoderConfig {
  pub fn new(codec: CodecId, geometry: Geometry) -> Self {
    Self {
      codec,
      geometry,
      ..Self::default()
    }
  }

  /// Default configuration for `codec`, with overrides read from the
  /// environment
  pub fn from_env(codec: CodecId, geometry: Geometry) -> Self {
    let mut config = Self::new(codec, geometry);
    config.apply_overrides(|key| std::env::var(key).ok());
    config
  }

  /// Apply overrides from a key lookup; unparsable values are ignored
  pub fn apply_overrides<L>(&mut self, lookup: L)
  where
    L: Fn(&str) -> Option<String>,
  {
    if let Some(fast) = lookup(ENV_FAST) {
      self.fast_decode = matches!(fast.trim(), "1" | "true" | "yes" | "on");
    }
    if let Some(value) = lookup(ENV_REORDER_PTS) {
      match TimestampSource::parse(&value) {
        Some(source) => self.timestamp_source = source,
        None => tracing::warn!(
          target: "softvdec",
          "ignoring invalid {}={:?}",
          ENV_REORDER_PTS,
          value
        ),
      }
    }
  }
}
