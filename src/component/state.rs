//! End-of-stream progression, geometry suspension and log-once bookkeeping

use std::collections::HashSet;

use crate::codec::Geometry;

/// End-of-stream progression of the component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EosStatus {
  /// Input is flowing
  #[default]
  DataAvailable,
  /// An input buffer carried the end-of-stream flag; buffered frames are
  /// being drained
  EosSeen,
  /// The end-of-stream output buffer was emitted
  FramesFlushed,
}

/// Classes of non-fatal errors reported at most once per open session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
  SendPacket,
  ReceiveFrame,
  HwAccel,
  ExtradataFrozen,
}

/// Set of error classes already logged
#[derive(Debug, Default)]
pub struct ErrorLog {
  logged: HashSet<ErrorClass>,
}

impl ErrorLog {
  /// Record `class`, returning true the first time it is seen
  pub fn log_once(&mut self, class: ErrorClass) -> bool {
    self.logged.insert(class)
  }

  pub fn contains(&self, class: ErrorClass) -> bool {
    self.logged.contains(&class)
  }

  pub fn clear(&mut self) {
    self.logged.clear();
  }
}

/// Decode state of the drive loop
#[derive(Debug, Default)]
pub struct DecodeStateMachine {
  eos: EosStatus,
  /// Geometry requested from the host while decoding is suspended
  awaiting: Option<Geometry>,
  rejecting: bool,
}

impl DecodeStateMachine {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn eos_status(&self) -> EosStatus {
    self.eos
  }

  /// Check if buffered frames are being drained
  #[inline]
  pub fn is_draining(&self) -> bool {
    self.eos == EosStatus::EosSeen
  }

  /// Input carried the end-of-stream flag
  pub fn on_input_eos(&mut self) {
    if self.eos == EosStatus::DataAvailable {
      tracing::debug!(target: "softvdec", "input end of stream");
      self.eos = EosStatus::EosSeen;
    }
  }

  /// The end-of-stream output buffer was emitted
  pub fn on_frames_flushed(&mut self) {
    self.eos = EosStatus::FramesFlushed;
  }

  /// The input port was flushed by the host
  pub fn on_input_flushed(&mut self) {
    self.eos = EosStatus::DataAvailable;
  }

  /// Suspend until the host applies `geometry` to the output port
  pub fn suspend(&mut self, geometry: Geometry) {
    self.awaiting = Some(geometry);
  }

  /// Leave suspension, returning the geometry that was requested
  pub fn resume(&mut self) -> Option<Geometry> {
    self.awaiting.take()
  }

  #[inline]
  pub fn is_suspended(&self) -> bool {
    self.awaiting.is_some()
  }

  pub fn awaiting_geometry(&self) -> Option<Geometry> {
    self.awaiting
  }

  /// Latch rejection after a fatal error
  pub fn reject(&mut self) {
    self.rejecting = true;
  }

  #[inline]
  pub fn is_rejecting(&self) -> bool {
    self.rejecting
  }

  /// Check if the drive loop may run at all
  pub fn can_drive(&self) -> bool {
    !self.rejecting && self.awaiting.is_none() && self.eos != EosStatus::FramesFlushed
  }

  /// Check if one more iteration of the drive loop can make progress
  pub fn has_work(&self, has_input: bool, has_output: bool) -> bool {
    (self.eos != EosStatus::DataAvailable || has_input) && has_output
  }

  /// Back to the initial state
  pub fn reset(&mut self) {
    *self = Self::default();
  }
}
