//! Port interface between the host and the decoder core
//!
//! The core consumes [`BufferPorts`] only. [`PortQueues`] is a queue-backed
//! implementation that reports every completion as a [`HostEvent`] on a
//! crossbeam channel, so a host may consume them on another thread.

use std::collections::VecDeque;

use crossbeam::channel::{self, Receiver, Sender};

use super::buffer::{InputBuffer, OutputBuffer};
use super::error::ComponentError;
use crate::codec::Geometry;

/// Port indexes of the component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PortIndex {
  Input = 0,
  Output = 1,
}

impl TryFrom<u32> for PortIndex {
  type Error = ComponentError;

  fn try_from(index: u32) -> Result<Self, Self::Error> {
    match index {
      0 => Ok(Self::Input),
      1 => Ok(Self::Output),
      other => Err(ComponentError::BadPortIndex(other)),
    }
  }
}

/// Host buffer-exchange protocol as seen by the decoder core
pub trait BufferPorts {
  /// Peek at the next input buffer without taking ownership
  fn input_head(&self) -> Option<&InputBuffer>;

  /// Take ownership of the next input buffer
  fn dequeue_input(&mut self) -> Option<InputBuffer>;

  fn has_output(&self) -> bool;

  /// Take ownership of the next output buffer
  fn dequeue_output(&mut self) -> Option<OutputBuffer>;

  /// Return a consumed input buffer to the host
  fn empty_buffer_done(&mut self, buffer: InputBuffer);

  /// Return a filled output buffer to the host
  fn fill_buffer_done(&mut self, buffer: OutputBuffer);

  /// Geometry currently negotiated on the output port
  fn output_geometry(&self) -> Geometry;

  /// Ask the host to renegotiate the output port to `geometry`
  fn request_output_geometry(&mut self, geometry: Geometry);

  /// Record an output port definition written through the parameter surface
  fn set_output_geometry(&mut self, geometry: Geometry);

  /// Report a fatal error to the host
  fn report_error(&mut self, error: &ComponentError);
}

/// Notification delivered to the host
#[derive(Debug)]
pub enum HostEvent {
  EmptyBufferDone(InputBuffer),
  FillBufferDone(OutputBuffer),
  /// The component needs the output port reconfigured
  PortSettingsChanged { port: PortIndex, geometry: Geometry },
  /// The component hit a fatal error and rejects work until reset
  Error(String),
}

/// Queue-backed ports reporting completions over a channel
#[derive(Debug)]
pub struct PortQueues {
  input: VecDeque<InputBuffer>,
  output: VecDeque<OutputBuffer>,
  geometry: Geometry,
  requested: Option<Geometry>,
  events: Sender<HostEvent>,
}

impl PortQueues {
  /// Create empty queues negotiated at `geometry`, returning the event
  /// receiver for the host
  pub fn new(geometry: Geometry) -> (Self, Receiver<HostEvent>) {
    let (sender, receiver) = channel::unbounded();
    let queues = Self {
      input: VecDeque::new(),
      output: VecDeque::new(),
      geometry,
      requested: None,
      events: sender,
    };
    (queues, receiver)
  }

  pub fn queue_input(&mut self, buffer: InputBuffer) {
    self.input.push_back(buffer);
  }

  pub fn queue_output(&mut self, buffer: OutputBuffer) {
    self.output.push_back(buffer);
  }

  pub fn input_len(&self) -> usize {
    self.input.len()
  }

  pub fn output_len(&self) -> usize {
    self.output.len()
  }

  /// Geometry the component asked for and the host has not applied yet
  pub fn requested_geometry(&self) -> Option<Geometry> {
    self.requested
  }

  /// Commit the requested output geometry
  ///
  /// Queued output buffers sized for the old geometry are returned to the
  /// host unfilled; the host queues new ones and then notifies the component.
  pub fn apply_requested_geometry(&mut self) -> Option<Geometry> {
    let geometry = self.requested.take()?;
    self.geometry = geometry;
    self.flush(PortIndex::Output);
    Some(geometry)
  }

  /// Return every queued buffer of `port` to the host
  pub fn flush(&mut self, port: PortIndex) {
    match port {
      PortIndex::Input => {
        while let Some(buffer) = self.input.pop_front() {
          self.emit(HostEvent::EmptyBufferDone(buffer));
        }
      }
      PortIndex::Output => {
        while let Some(buffer) = self.output.pop_front() {
          self.emit(HostEvent::FillBufferDone(buffer));
        }
      }
    }
  }

  fn emit(&self, event: HostEvent) {
    if self.events.send(event).is_err() {
      tracing::debug!(target: "softvdec", "host event receiver dropped");
    }
  }
}

impl BufferPorts for PortQueues {
  fn input_head(&self) -> Option<&InputBuffer> {
    self.input.front()
  }

  fn dequeue_input(&mut self) -> Option<InputBuffer> {
    self.input.pop_front()
  }

  fn has_output(&self) -> bool {
    !self.output.is_empty()
  }

  fn dequeue_output(&mut self) -> Option<OutputBuffer> {
    self.output.pop_front()
  }

  fn empty_buffer_done(&mut self, buffer: InputBuffer) {
    self.emit(HostEvent::EmptyBufferDone(buffer));
  }

  fn fill_buffer_done(&mut self, buffer: OutputBuffer) {
    self.emit(HostEvent::FillBufferDone(buffer));
  }

  fn output_geometry(&self) -> Geometry {
    self.geometry
  }

  fn request_output_geometry(&mut self, geometry: Geometry) {
    self.requested = Some(geometry);
    self.emit(HostEvent::PortSettingsChanged {
      port: PortIndex::Output,
      geometry,
    });
  }

  fn set_output_geometry(&mut self, geometry: Geometry) {
    self.geometry = geometry;
  }

  fn report_error(&mut self, error: &ComponentError) {
    self.emit(HostEvent::Error(error.to_string()));
  }
}
