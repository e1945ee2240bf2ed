//! Shared harness driving the component through channel-backed ports

#![allow(dead_code)]

use crossbeam::channel::Receiver;
use softvdec::codec::HwAccel;
use softvdec::testing::{ScriptedContext, ScriptedEngine, ScriptedStats};
use softvdec::{
  BufferFlags, BufferPorts, CodecId, DecoderConfig, Geometry, HostEvent, InputBuffer, OutputBuffer,
  PortQueues, SoftVideoDecoder,
};

pub const GEOMETRY: Geometry = Geometry::new(16, 16);

/// First output buffer id; input ids count up from 1
pub const OUTPUT_ID_BASE: u64 = 1000;

pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

pub struct Harness {
  pub decoder: SoftVideoDecoder<ScriptedEngine, PortQueues>,
  pub events: Receiver<HostEvent>,
  pub stats: ScriptedStats,
  next_input: u64,
  next_output: u64,
}

impl Harness {
  pub fn new(engine: ScriptedEngine) -> Self {
    Self::with_config(engine, DecoderConfig::new(CodecId::H264, GEOMETRY))
  }

  pub fn with_config(engine: ScriptedEngine, config: DecoderConfig) -> Self {
    init_tracing();
    let stats = engine.stats();
    let (ports, events) = PortQueues::new(config.geometry);
    let decoder = SoftVideoDecoder::new(engine, ports, config).unwrap();
    Self::from_parts(decoder, events, stats)
  }

  pub fn with_hwaccel(engine: ScriptedEngine, hwaccel: Box<dyn HwAccel<ScriptedContext>>) -> Self {
    init_tracing();
    let stats = engine.stats();
    let (ports, events) = PortQueues::new(GEOMETRY);
    let config = DecoderConfig::new(CodecId::H264, GEOMETRY);
    let decoder = SoftVideoDecoder::with_hwaccel(engine, ports, config, hwaccel).unwrap();
    Self::from_parts(decoder, events, stats)
  }

  fn from_parts(
    decoder: SoftVideoDecoder<ScriptedEngine, PortQueues>,
    events: Receiver<HostEvent>,
    stats: ScriptedStats,
  ) -> Self {
    Self {
      decoder,
      events,
      stats,
      next_input: 1,
      next_output: OUTPUT_ID_BASE,
    }
  }

  fn input_id(&mut self) -> u64 {
    let id = self.next_input;
    self.next_input += 1;
    id
  }

  /// Queue one data buffer, returning its id
  pub fn data(&mut self, payload: &[u8], timestamp: i64) -> u64 {
    let id = self.input_id();
    self
      .decoder
      .ports_mut()
      .queue_input(InputBuffer::new(id, payload.to_vec(), timestamp));
    id
  }

  pub fn codec_config(&mut self, payload: &[u8]) -> u64 {
    let id = self.input_id();
    self
      .decoder
      .ports_mut()
      .queue_input(InputBuffer::codec_config(id, payload.to_vec()));
    id
  }

  /// Queue an end-of-stream buffer without payload
  pub fn eos(&mut self) -> u64 {
    let id = self.input_id();
    self.decoder.ports_mut().queue_input(InputBuffer::eos(id));
    id
  }

  /// Queue an end-of-stream buffer that still carries a picture
  pub fn eos_with(&mut self, payload: &[u8], timestamp: i64) -> u64 {
    let id = self.input_id();
    let buffer = InputBuffer::new(id, payload.to_vec(), timestamp).with_flags(BufferFlags::EOS);
    self.decoder.ports_mut().queue_input(buffer);
    id
  }

  /// Queue `count` output buffers sized for the current output geometry
  pub fn outputs(&mut self, count: usize) {
    let size = self.decoder.ports().output_geometry().i420_size();
    for _ in 0..count {
      let id = self.next_output;
      self.next_output += 1;
      self
        .decoder
        .ports_mut()
        .queue_output(OutputBuffer::new(id, size));
    }
  }

  pub fn run(&mut self) -> Vec<HostEvent> {
    self.decoder.on_queue_filled();
    self.take_events()
  }

  pub fn take_events(&self) -> Vec<HostEvent> {
    self.events.try_iter().collect()
  }
}

/// Ids of input buffers returned to the host, in order
pub fn emptied(events: &[HostEvent]) -> Vec<u64> {
  events
    .iter()
    .filter_map(|event| match event {
      HostEvent::EmptyBufferDone(buffer) => Some(buffer.id),
      _ => None,
    })
    .collect()
}

/// Output buffers returned to the host, in order
pub fn filled(events: &[HostEvent]) -> Vec<&OutputBuffer> {
  events
    .iter()
    .filter_map(|event| match event {
      HostEvent::FillBufferDone(buffer) => Some(buffer),
      _ => None,
    })
    .collect()
}

/// Output buffers that carry a picture
pub fn pictures(events: &[HostEvent]) -> Vec<&OutputBuffer> {
  filled(events)
    .into_iter()
    .filter(|buffer| !buffer.is_eos())
    .collect()
}

pub fn errors(events: &[HostEvent]) -> Vec<&str> {
  events
    .iter()
    .filter_map(|event| match event {
      HostEvent::Error(message) => Some(message.as_str()),
      _ => None,
    })
    .collect()
}

pub fn geometry_requests(events: &[HostEvent]) -> Vec<Geometry> {
  events
    .iter()
    .filter_map(|event| match event {
      HostEvent::PortSettingsChanged { geometry, .. } => Some(*geometry),
      _ => None,
    })
    .collect()
}
