//! Transient submission unit for one decode attempt

/// One packet of compressed data borrowed from the head input buffer
///
/// Built fresh for every decode attempt and never stored. A packet without
/// data is the end-of-stream drain packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
  data: Option<&'a [u8]>,
  pts: Option<i64>,
  dts: Option<i64>,
}

impl<'a> Packet<'a> {
  /// Build a packet from an input payload, copying the timestamp into both
  /// presentation and decode fields
  pub fn from_input(data: &'a [u8], timestamp: i64) -> Self {
    Self {
      data: Some(data),
      pts: Some(timestamp),
      dts: Some(timestamp),
    }
  }

  /// Build the empty packet that asks the decoder to release buffered frames
  pub fn drain() -> Self {
    Self {
      data: None,
      pts: None,
      dts: None,
    }
  }

  /// Get the payload, empty for a drain packet
  #[inline]
  pub fn data(&self) -> &'a [u8] {
    self.data.unwrap_or(&[])
  }

  #[inline]
  pub fn size(&self) -> usize {
    self.data().len()
  }

  /// Check if this is the end-of-stream drain packet
  #[inline]
  pub fn is_drain(&self) -> bool {
    self.data.is_none()
  }

  #[inline]
  pub fn pts(&self) -> Option<i64> {
    self.pts
  }

  #[inline]
  pub fn dts(&self) -> Option<i64> {
    self.dts
  }
}
