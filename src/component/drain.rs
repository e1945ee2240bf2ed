//! One decode attempt, picture conversion and end-of-stream emission

use super::buffer::BufferFlags;
use super::error::{ComponentError, ComponentResult};
use super::lifecycle::DecoderLifecycle;
use super::ports::BufferPorts;
use super::state::{DecodeStateMachine, ErrorClass};
use crate::codec::{
  CodecError, ConversionKey, DecoderContext, DecoderEngine, I420Planes, Packet, Picture, Scale,
};
use crate::config::TimestampSource;

/// Result of one decode attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
  /// A picture is waiting in the frame holder
  Frame,
  /// Nothing to output this attempt
  NoFrame,
  /// The decoder has released everything it buffered
  Flushed,
}

enum Received {
  Frame,
  Nothing,
}

impl<E: DecoderEngine> DecoderLifecycle<E> {
  /// Run one decode attempt against the head input buffer
  ///
  /// The head buffer, if any, is consumed and returned to the host exactly
  /// once whatever the outcome. Without a head buffer an empty drain packet
  /// is submitted.
  pub fn decode_step<P: BufferPorts>(
    &mut self,
    ports: &mut P,
    state: &DecodeStateMachine,
  ) -> ComponentResult<DecodeOutcome> {
    let codec = self.codec();
    let delay = self.has_delay();
    let draining = state.is_draining();
    let head_empty = ports.input_head().map_or(true, |head| head.is_empty());

    // Nothing left to submit and nothing held back by the decoder
    if draining && head_empty && !delay {
      return Ok(DecodeOutcome::Flushed);
    }

    let (Some(context), Some(frame), Some(holder)) = (
      self.context.as_mut(),
      self.frame.as_mut(),
      self.packet.as_mut(),
    ) else {
      return Err(ComponentError::IncorrectState("decoder is not open"));
    };

    let input = ports.dequeue_input();
    let packet = match &input {
      Some(buffer) => Packet::from_input(buffer.payload(), buffer.timestamp),
      None => Packet::drain(),
    };
    let consumed_empty = packet.size() == 0;

    if let Err(err) = context.send_packet(holder, &packet) {
      if !err.would_block() && self.errors.log_once(ErrorClass::SendPacket) {
        tracing::warn!(
          target: "softvdec",
          "failed to send packet, skipping (logged only once): {}",
          err
        );
      }
    }

    let received = match context.receive_frame(frame) {
      Ok(()) => Received::Frame,
      Err(err) if err.would_block() => Received::Nothing,
      Err(err) => {
        if self.errors.log_once(ErrorClass::ReceiveFrame) {
          tracing::warn!(
            target: "softvdec",
            "failed to decode frame (logged only once): {}",
            err
          );
        }
        Received::Nothing
      }
    };

    let outcome = match received {
      Received::Frame => match self.hwaccel.get_frame(context, frame) {
        Ok(()) => DecodeOutcome::Frame,
        Err(err) => {
          if self.errors.log_once(ErrorClass::HwAccel) {
            tracing::warn!(
              target: "softvdec",
              "hardware frame retrieval failed (logged only once): {}",
              err
            );
          }
          DecodeOutcome::NoFrame
        }
      },
      Received::Nothing if draining && (!delay || input.is_none() || consumed_empty) => {
        tracing::info!(target: "softvdec", "{} decoder flushed", codec);
        DecodeOutcome::Flushed
      }
      Received::Nothing => DecodeOutcome::NoFrame,
    };

    if let Some(buffer) = input {
      ports.empty_buffer_done(buffer);
    }

    Ok(outcome)
  }

  /// Convert the pending picture into the next output buffer
  ///
  /// The output buffer is returned to the host even when conversion fails,
  /// with a zero fill length.
  pub fn drain_one_output_buffer<P: BufferPorts>(
    &mut self,
    ports: &mut P,
    source: TimestampSource,
  ) -> ComponentResult<()> {
    let geometry = ports.output_geometry();
    let mut output = ports
      .dequeue_output()
      .ok_or(ComponentError::IncorrectState("no output buffer queued"))?;
    output.reset_result();

    let Some(frame) = self.frame.as_ref() else {
      ports.fill_buffer_done(output);
      return Err(ComponentError::IncorrectState("no decoded frame"));
    };

    let key = ConversionKey::new(frame.geometry(), frame.format(), geometry);
    let engine = &mut self.engine;
    let converted = self
      .scaler
      .get_or_rebuild(key, |key| engine.create_scaler(key))
      .ok_or_else(|| {
        CodecError::InvalidConfig(format!(
          "Cannot initialize the conversion context for {:?} {}",
          key.src_format, key.src
        ))
      })
      .and_then(|scaler| {
        let mut planes = I420Planes::split(&mut output.data, geometry)?;
        scaler.scale(frame, &mut planes)
      });

    if let Err(err) = converted {
      tracing::error!(target: "softvdec", "picture conversion failed: {}", err);
      ports.fill_buffer_done(output);
      return Err(ComponentError::Conversion(err));
    }

    output.filled_len = geometry.i420_size();
    if frame.is_key_frame() {
      output.flags.insert(BufferFlags::SYNC_FRAME);
    }
    output.timestamp = select_timestamp(frame, source);
    ports.fill_buffer_done(output);
    Ok(())
  }
}

/// Emit the zero-length end-of-stream output buffer
pub fn drain_eos_output_buffer<P: BufferPorts>(
  ports: &mut P,
  state: &mut DecodeStateMachine,
) -> ComponentResult<()> {
  let mut output = ports
    .dequeue_output()
    .ok_or(ComponentError::IncorrectState("no output buffer queued"))?;
  output.reset_result();
  output.flags = BufferFlags::EOS;
  tracing::debug!(target: "softvdec", "emitting end-of-stream output buffer");
  ports.fill_buffer_done(output);
  state.on_frames_flushed();
  Ok(())
}

/// Pick the output timestamp of a picture; unknown becomes 0
pub fn select_timestamp<F: Picture>(frame: &F, source: TimestampSource) -> i64 {
  let timestamp = match source {
    TimestampSource::Auto if frame.has_best_effort_timestamp() => frame.best_effort_timestamp(),
    TimestampSource::Auto | TimestampSource::Presentation => frame.pts(),
    TimestampSource::Decode => frame.pkt_dts(),
  };
  timestamp.unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::{PixelFormat, Plane};

  struct Stamps {
    best_effort: Option<i64>,
    pts: Option<i64>,
    dts: Option<i64>,
    supports_best_effort: bool,
  }

  impl Picture for Stamps {
    fn width(&self) -> u32 {
      2
    }
    fn height(&self) -> u32 {
      2
    }
    fn format(&self) -> PixelFormat {
      PixelFormat::Yuv420p
    }
    fn is_key_frame(&self) -> bool {
      false
    }
    fn pts(&self) -> Option<i64> {
      self.pts
    }
    fn pkt_dts(&self) -> Option<i64> {
      self.dts
    }
    fn best_effort_timestamp(&self) -> Option<i64> {
      self.best_effort
    }
    fn has_best_effort_timestamp(&self) -> bool {
      self.supports_best_effort
    }
    fn plane(&self, _index: usize) -> Option<Plane<'_>> {
      None
    }
  }

  #[test]
  fn test_best_effort_preferred() {
    let frame = Stamps {
      best_effort: Some(33),
      pts: Some(40),
      dts: Some(20),
      supports_best_effort: true,
    };
    assert_eq!(select_timestamp(&frame, TimestampSource::Auto), 33);
    assert_eq!(select_timestamp(&frame, TimestampSource::Presentation), 40);
    assert_eq!(select_timestamp(&frame, TimestampSource::Decode), 20);
  }

  #[test]
  fn test_auto_without_best_effort_uses_pts() {
    let frame = Stamps {
      best_effort: Some(33),
      pts: Some(40),
      dts: Some(20),
      supports_best_effort: false,
    };
    assert_eq!(select_timestamp(&frame, TimestampSource::Auto), 40);
  }

  #[test]
  fn test_unknown_timestamp_is_zero() {
    let frame = Stamps {
      best_effort: None,
      pts: None,
      dts: None,
      supports_best_effort: true,
    };
    for source in [
      TimestampSource::Auto,
      TimestampSource::Presentation,
      TimestampSource::Decode,
    ] {
      assert_eq!(select_timestamp(&frame, source), 0);
    }
  }
}
