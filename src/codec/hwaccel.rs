//! Hardware-acceleration hook
//!
//! The decode loop consumes only three calls: attach before open, populate a
//! freshly received frame, detach at close. Backends live behind this trait.

use super::{DecoderContext, EngineError};

/// Optional assist that attaches to a context and fills decoded frames
pub trait HwAccel<C: DecoderContext> {
  /// Attach to `ctx` before it is opened
  ///
  /// Returns false when no device is available; decoding then continues in
  /// software.
  fn init(&mut self, ctx: &mut C) -> bool;

  /// Populate `frame` after the decoder produced it
  ///
  /// Failures are non-fatal; the frame is skipped.
  fn get_frame(&mut self, ctx: &mut C, frame: &mut C::Frame) -> Result<(), EngineError>;

  /// Detach from `ctx` before it is closed
  fn deinit(&mut self, ctx: &mut C);

  fn name(&self) -> &str;
}

/// Hook that never attaches; frames pass through untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHwAccel;

impl<C: DecoderContext> HwAccel<C> for NoHwAccel {
  fn init(&mut self, _ctx: &mut C) -> bool {
    false
  }

  fn get_frame(&mut self, _ctx: &mut C, _frame: &mut C::Frame) -> Result<(), EngineError> {
    Ok(())
  }

  fn deinit(&mut self, _ctx: &mut C) {}

  fn name(&self) -> &str {
    "none"
  }
}
