//! Parameter surface of the component
//!
//! Settings are validated synchronously at the call boundary; invalid port
//! indexes and unsupported formats never reach the decoder context.

use super::error::{ComponentError, ComponentResult};
use super::ports::PortIndex;
use crate::codec::{CodecId, Geometry};

/// Windows Media Video stream versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmvFormat {
  Wmv7,
  Wmv8,
  Wmv9,
  /// Advanced profile and anything newer
  Vc1,
}

impl WmvFormat {
  pub fn codec(&self) -> CodecId {
    match self {
      Self::Wmv7 => CodecId::Wmv1,
      Self::Wmv8 => CodecId::Wmv2,
      Self::Wmv9 => CodecId::Wmv3,
      Self::Vc1 => CodecId::Vc1,
    }
  }

  pub fn from_codec(codec: CodecId) -> Option<Self> {
    match codec {
      CodecId::Wmv1 => Some(Self::Wmv7),
      CodecId::Wmv2 => Some(Self::Wmv8),
      CodecId::Wmv3 => Some(Self::Wmv9),
      CodecId::Vc1 => Some(Self::Vc1),
      _ => None,
    }
  }
}

/// RealVideo stream versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RvFormat {
  G2,
  Rv8,
  Rv9,
  /// Any other version number carried by the container
  Other(u32),
}

impl RvFormat {
  pub fn codec(&self) -> ComponentResult<CodecId> {
    match self {
      Self::G2 => Ok(CodecId::Rv20),
      Self::Rv8 => Ok(CodecId::Rv30),
      Self::Rv9 => Ok(CodecId::Rv40),
      Self::Other(version) => Err(ComponentError::UnsupportedSetting(format!(
        "RealVideo format {:#x}",
        version
      ))),
    }
  }

  pub fn from_codec(codec: CodecId) -> Option<Self> {
    match codec {
      CodecId::Rv20 => Some(Self::G2),
      CodecId::Rv30 => Some(Self::Rv8),
      CodecId::Rv40 => Some(Self::Rv9),
      _ => None,
    }
  }
}

/// A setting written through [`crate::SoftVideoDecoder::set_parameter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoParam {
  /// Codec identity and declared geometry of the input stream
  Codec {
    port: u32,
    codec: CodecId,
    geometry: Geometry,
  },
  /// Frame geometry of one port
  PortDefinition { port: u32, geometry: Geometry },
  Wmv { port: u32, format: WmvFormat },
  Rv { port: u32, format: RvFormat },
}

impl VideoParam {
  /// Build a codec setting from a raw FFmpeg codec ID
  pub fn codec_from_raw(port: u32, raw: i32, geometry: Geometry) -> ComponentResult<Self> {
    let codec = CodecId::from_raw(raw)
      .ok_or_else(|| ComponentError::UnsupportedSetting(format!("codec id {}", raw)))?;
    Ok(Self::Codec {
      port,
      codec,
      geometry,
    })
  }
}

/// A setting read through [`crate::SoftVideoDecoder::get_parameter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoParamIndex {
  Codec { port: u32 },
  PortDefinition { port: u32 },
  Wmv { port: u32 },
  Rv { port: u32 },
}

/// Current value of a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoParamValue {
  Codec { codec: CodecId, geometry: Geometry },
  PortDefinition { port: PortIndex, geometry: Geometry },
  /// None when the configured codec is not a WMV variant
  Wmv(Option<WmvFormat>),
  /// None when the configured codec is not a RealVideo variant
  Rv(Option<RvFormat>),
}

/// Accept only the input port for codec-level settings
pub(crate) fn require_input_port(port: u32) -> ComponentResult<()> {
  match PortIndex::try_from(port)? {
    PortIndex::Input => Ok(()),
    PortIndex::Output => Err(ComponentError::BadPortIndex(port)),
  }
}
