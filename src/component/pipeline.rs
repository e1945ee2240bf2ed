//! Drive loop over the host's port queues
//!
//! [`SoftVideoDecoder`] is driven synchronously by the host: after queueing
//! buffers it calls [`SoftVideoDecoder::on_queue_filled`], which makes as
//! much progress as the queues allow and returns. Every buffer taken from a
//! queue is handed back through exactly one completion callback, on error
//! paths included.

use super::drain::{drain_eos_output_buffer, DecodeOutcome};
use super::error::{ComponentError, ComponentResult};
use super::lifecycle::DecoderLifecycle;
use super::params::{
  require_input_port, RvFormat, VideoParam, VideoParamIndex, VideoParamValue, WmvFormat,
};
use super::ports::{BufferPorts, PortIndex};
use super::state::{DecodeStateMachine, EosStatus};
use crate::codec::{DecoderEngine, Geometry, HwAccel, NoHwAccel, Picture};
use crate::config::DecoderConfig;

/// Software video decoder component
pub struct SoftVideoDecoder<E: DecoderEngine, P: BufferPorts> {
  lifecycle: DecoderLifecycle<E>,
  ports: P,
  state: DecodeStateMachine,
  /// A decoded picture is waiting in the frame holder
  frame_pending: bool,
}

impl<E: DecoderEngine, P: BufferPorts> SoftVideoDecoder<E, P> {
  /// Create a component decoding in software
  pub fn new(engine: E, ports: P, config: DecoderConfig) -> ComponentResult<Self> {
    Self::with_hwaccel(engine, ports, config, Box::new(NoHwAccel))
  }

  /// Create a component with a hardware-acceleration hook
  pub fn with_hwaccel(
    engine: E,
    ports: P,
    config: DecoderConfig,
    hwaccel: Box<dyn HwAccel<E::Context>>,
  ) -> ComponentResult<Self> {
    tracing::debug!(
      target: "softvdec",
      "creating {} decoder component at {}",
      config.codec,
      config.geometry
    );
    Ok(Self {
      lifecycle: DecoderLifecycle::new(engine, config, hwaccel)?,
      ports,
      state: DecodeStateMachine::new(),
      frame_pending: false,
    })
  }

  // ========================================================================
  // Drive loop
  // ========================================================================

  /// Process queued buffers until no further progress is possible
  pub fn on_queue_filled(&mut self) {
    if !self.state.can_drive() {
      return;
    }

    if self.frame_pending {
      match self.emit_pending_frame() {
        Ok(true) => {}
        Ok(false) => return,
        Err(err) => return self.fail(err),
      }
    }

    while self
      .state
      .has_work(self.ports.input_head().is_some(), self.ports.has_output())
    {
      if self.state.is_draining() {
        return self.drain_all();
      }

      let Some(head) = self.ports.input_head() else {
        break;
      };

      if head.is_eos() {
        self.state.on_input_eos();
        // An EOS buffer carrying payload stays queued for the drain
        if head.is_empty() {
          self.return_head_input();
        }
        continue;
      }

      if head.is_codec_config() {
        if let Some(buffer) = self.ports.dequeue_input() {
          tracing::debug!(
            target: "softvdec",
            "got codec configuration buffer ({} bytes)",
            buffer.payload().len()
          );
          let appended = self.lifecycle.append_configuration_data(buffer.payload());
          self.ports.empty_buffer_done(buffer);
          match appended {
            Ok(()) | Err(ComponentError::ExtradataFrozen) => {}
            Err(err) => return self.fail(err),
          }
        }
        continue;
      }

      if head.is_empty() {
        self.return_head_input();
        continue;
      }

      if let Err(err) = self.lifecycle.open() {
        return self.fail(err);
      }

      match self.lifecycle.decode_step(&mut self.ports, &self.state) {
        Err(err) => return self.fail(err),
        Ok(DecodeOutcome::Flushed) => return self.emit_eos(),
        Ok(DecodeOutcome::NoFrame) => continue,
        Ok(DecodeOutcome::Frame) => {
          self.frame_pending = true;
          match self.emit_pending_frame() {
            Ok(true) => continue,
            Ok(false) => return,
            Err(err) => return self.fail(err),
          }
        }
      }
    }
  }

  /// Decode until the decoder is empty, then emit the end-of-stream buffer
  fn drain_all(&mut self) {
    self.return_codec_config_heads();
    if !self.lifecycle.is_open() {
      let has_payload = self
        .ports
        .input_head()
        .is_some_and(|head| !head.is_empty());
      if !has_payload {
        return self.emit_eos();
      }
      if let Err(err) = self.lifecycle.open() {
        return self.fail(err);
      }
    }

    while self.ports.has_output() {
      self.return_codec_config_heads();
      match self.lifecycle.decode_step(&mut self.ports, &self.state) {
        Err(err) => return self.fail(err),
        Ok(DecodeOutcome::Flushed) => return self.emit_eos(),
        Ok(DecodeOutcome::NoFrame) => continue,
        Ok(DecodeOutcome::Frame) => {
          self.frame_pending = true;
          match self.emit_pending_frame() {
            Ok(true) => continue,
            Ok(false) => return,
            Err(err) => return self.fail(err),
          }
        }
      }
    }
  }

  /// Emit the pending picture, or suspend if its geometry needs renegotiation
  ///
  /// Returns false when the picture is still pending.
  fn emit_pending_frame(&mut self) -> ComponentResult<bool> {
    let Some(frame_geometry) = self.pending_geometry() else {
      self.frame_pending = false;
      return Ok(true);
    };

    let negotiated = self.ports.output_geometry();
    if frame_geometry != negotiated {
      tracing::info!(
        target: "softvdec",
        "output geometry changes from {} to {}",
        negotiated,
        frame_geometry
      );
      self.ports.request_output_geometry(frame_geometry);
      self.state.suspend(frame_geometry);
      return Ok(false);
    }

    if !self.ports.has_output() {
      return Ok(false);
    }

    self.frame_pending = false;
    let source = self.lifecycle.config().timestamp_source;
    self.lifecycle.drain_one_output_buffer(&mut self.ports, source)?;
    Ok(true)
  }

  fn pending_geometry(&self) -> Option<Geometry> {
    self.lifecycle.frame.as_ref().map(|frame| frame.geometry())
  }

  fn emit_eos(&mut self) {
    if let Err(err) = drain_eos_output_buffer(&mut self.ports, &mut self.state) {
      self.fail(err);
    }
  }

  /// Hand back configuration buffers queued behind EOS without decoding them
  fn return_codec_config_heads(&mut self) {
    while self
      .ports
      .input_head()
      .is_some_and(|head| head.is_codec_config())
    {
      tracing::debug!(target: "softvdec", "ignoring codec configuration after end of stream");
      self.return_head_input();
    }
  }

  fn return_head_input(&mut self) {
    if let Some(buffer) = self.ports.dequeue_input() {
      self.ports.empty_buffer_done(buffer);
    }
  }

  /// Report a fatal error and reject work until reset
  fn fail(&mut self, err: ComponentError) {
    tracing::error!(target: "softvdec", "decoder component failed: {}", err);
    self.ports.report_error(&err);
    self.state.reject();
  }

  // ========================================================================
  // Host entry points
  // ========================================================================

  /// The host finished flushing `port`
  pub fn on_port_flush_completed(&mut self, port: u32) -> ComponentResult<()> {
    match PortIndex::try_from(port)? {
      PortIndex::Input => {
        tracing::info!(target: "softvdec", "input port flushed");
        self.lifecycle.flush();
        self.state.on_input_flushed();
        self.frame_pending = false;
      }
      PortIndex::Output => {
        tracing::debug!(target: "softvdec", "output port flushed");
      }
    }
    Ok(())
  }

  /// The host applied the requested output geometry; resume decoding
  pub fn on_output_port_reconfigured(&mut self) {
    if let Some(requested) = self.state.resume() {
      let applied = self.ports.output_geometry();
      if applied != requested {
        tracing::warn!(
          target: "softvdec",
          "requested output geometry {} but host applied {}",
          requested,
          applied
        );
      } else {
        tracing::info!(target: "softvdec", "output port reconfigured to {}", applied);
      }
    }
    self.on_queue_filled();
  }

  /// Tear down and re-create the decoder; clears a latched error
  pub fn on_reset(&mut self) -> ComponentResult<()> {
    tracing::debug!(target: "softvdec", "reset");
    self.state.reset();
    self.frame_pending = false;
    if let Err(err) = self.lifecycle.reset() {
      tracing::error!(target: "softvdec", "reset failed: {}", err);
      self.ports.report_error(&err);
      self.state.reject();
      return Err(err);
    }
    Ok(())
  }

  // ========================================================================
  // Parameters
  // ========================================================================

  pub fn set_parameter(&mut self, param: VideoParam) -> ComponentResult<()> {
    match param {
      VideoParam::Codec {
        port,
        codec,
        geometry,
      } => {
        require_input_port(port)?;
        tracing::debug!(target: "softvdec", "codec parameter {} {}", codec, geometry);
        self.lifecycle.set_codec(codec);
        self.lifecycle.set_dimensions(geometry);
      }
      VideoParam::PortDefinition { port, geometry } => match PortIndex::try_from(port)? {
        PortIndex::Input => {
          tracing::info!(target: "softvdec", "input port definition {}", geometry);
          self.lifecycle.set_dimensions(geometry);
        }
        PortIndex::Output => {
          tracing::info!(target: "softvdec", "output port definition {}", geometry);
          self.ports.set_output_geometry(geometry);
        }
      },
      VideoParam::Wmv { port, format } => {
        require_input_port(port)?;
        self.lifecycle.set_codec(format.codec());
      }
      VideoParam::Rv { port, format } => {
        require_input_port(port)?;
        let codec = format.codec()?;
        self.lifecycle.set_codec(codec);
      }
    }
    Ok(())
  }

  pub fn get_parameter(&self, index: VideoParamIndex) -> ComponentResult<VideoParamValue> {
    let codec = self.lifecycle.codec();
    match index {
      VideoParamIndex::Codec { port } => {
        require_input_port(port)?;
        Ok(VideoParamValue::Codec {
          codec,
          geometry: self.lifecycle.geometry(),
        })
      }
      VideoParamIndex::PortDefinition { port } => {
        let port = PortIndex::try_from(port)?;
        let geometry = match port {
          PortIndex::Input => self.lifecycle.geometry(),
          PortIndex::Output => self.ports.output_geometry(),
        };
        Ok(VideoParamValue::PortDefinition { port, geometry })
      }
      VideoParamIndex::Wmv { port } => {
        require_input_port(port)?;
        Ok(VideoParamValue::Wmv(WmvFormat::from_codec(codec)))
      }
      VideoParamIndex::Rv { port } => {
        require_input_port(port)?;
        Ok(VideoParamValue::Rv(RvFormat::from_codec(codec)))
      }
    }
  }

  // ========================================================================
  // Accessors
  // ========================================================================

  pub fn ports(&self) -> &P {
    &self.ports
  }

  pub fn ports_mut(&mut self) -> &mut P {
    &mut self.ports
  }

  pub fn lifecycle(&self) -> &DecoderLifecycle<E> {
    &self.lifecycle
  }

  pub fn eos_status(&self) -> EosStatus {
    self.state.eos_status()
  }

  /// Check if a fatal error latched rejection
  pub fn is_rejecting(&self) -> bool {
    self.state.is_rejecting()
  }

  /// Check if decoding waits for output port reconfiguration
  pub fn is_suspended(&self) -> bool {
    self.state.is_suspended()
  }
}

impl<E: DecoderEngine, P: BufferPorts> std::fmt::Debug for SoftVideoDecoder<E, P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SoftVideoDecoder")
      .field("lifecycle", &self.lifecycle)
      .field("state", &self.state)
      .field("frame_pending", &self.frame_pending)
      .finish()
  }
}
