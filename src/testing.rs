//! Scripted decoder engine
//!
//! - [`ScriptedEngine`]: deterministic in-memory [`DecoderEngine`] that turns
//!   every data packet into one picture, optionally holding frames back like
//!   a decoder with delay
//! - [`ScriptedStats`]: shared counters observed by tests
//! - [`ScriptedHwAccel`]: hardware hook with controllable failures

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::codec::{
  CodecId, ConversionKey, DecoderCapabilities, DecoderContext, DecoderDescriptor, DecoderEngine,
  EngineError, Geometry, HwAccel, OpenOptions, Packet, Picture, PixelFormat, Plane,
  SoftwareScaler,
};

const AVERROR_EINVAL: i32 = -22;
const AVERROR_INVALIDDATA: i32 = -1_094_995_529;

// ============================================================================
// Frames
// ============================================================================

/// A picture produced by [`ScriptedEngine`]
#[derive(Debug, Clone)]
pub struct ScriptedFrame {
  pub geometry: Geometry,
  pub format: PixelFormat,
  pub key_frame: bool,
  pub pts: Option<i64>,
  pub dts: Option<i64>,
  pub best_effort: Option<i64>,
  pub supports_best_effort: bool,
  /// Plane data with its stride
  pub planes: Vec<(Vec<u8>, usize)>,
}

impl Default for ScriptedFrame {
  fn default() -> Self {
    Self {
      geometry: Geometry::default(),
      format: PixelFormat::Yuv420p,
      key_frame: false,
      pts: None,
      dts: None,
      best_effort: None,
      supports_best_effort: true,
      planes: Vec::new(),
    }
  }
}

impl ScriptedFrame {
  /// Tightly packed I420 picture with a flat luma value and neutral chroma
  pub fn i420(geometry: Geometry, luma: u8) -> Self {
    let width = geometry.width as usize;
    let height = geometry.height as usize;
    let cw = width.div_ceil(2);
    let ch = height.div_ceil(2);
    Self {
      geometry,
      format: PixelFormat::Yuv420p,
      planes: vec![
        (vec![luma; width * height], width),
        (vec![128; cw * ch], cw),
        (vec![128; cw * ch], cw),
      ],
      ..Self::default()
    }
  }

  /// Picture of `format` with a flat luma value and neutral chroma
  pub fn filled(geometry: Geometry, format: PixelFormat, value: u8) -> Self {
    let width = geometry.width as usize;
    let height = geometry.height as usize;
    let cw = width.div_ceil(2);
    let ch = height.div_ceil(2);
    let luma = (vec![value; width * height], width);
    let planes = match format {
      PixelFormat::Nv12 | PixelFormat::Nv21 => vec![luma, (vec![128; cw * 2 * ch], cw * 2)],
      PixelFormat::Gray8 => vec![luma],
      PixelFormat::Yuv422p | PixelFormat::Yuvj422p => vec![
        luma,
        (vec![128; cw * height], cw),
        (vec![128; cw * height], cw),
      ],
      PixelFormat::Yuv444p | PixelFormat::Yuvj444p => vec![
        luma,
        (vec![128; width * height], width),
        (vec![128; width * height], width),
      ],
      _ => return Self { format, ..Self::i420(geometry, value) },
    };
    Self {
      geometry,
      format,
      planes,
      ..Self::default()
    }
  }
}

impl Picture for ScriptedFrame {
  fn width(&self) -> u32 {
    self.geometry.width
  }

  fn height(&self) -> u32 {
    self.geometry.height
  }

  fn format(&self) -> PixelFormat {
    self.format
  }

  fn is_key_frame(&self) -> bool {
    self.key_frame
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

  fn plane(&self, index: usize) -> Option<Plane<'_>> {
    self
      .planes
      .get(index)
      .map(|(data, stride)| Plane { data, stride: *stride })
  }
}

// ============================================================================
// Stats
// ============================================================================

#[derive(Debug, Default)]
struct Counters {
  contexts: u32,
  opens: u32,
  closes: u32,
  flushes: u32,
  packets: u32,
  drain_packets: u32,
  extradata: Vec<u8>,
  configured: Option<(CodecId, Geometry)>,
  options: Option<OpenOptions>,
  sent_timestamps: Vec<i64>,
}

/// Counters shared between a [`ScriptedEngine`] and the test observing it
#[derive(Debug, Clone, Default)]
pub struct ScriptedStats {
  inner: Rc<RefCell<Counters>>,
}

impl ScriptedStats {
  /// Contexts allocated so far
  pub fn contexts(&self) -> u32 {
    self.inner.borrow().contexts
  }

  /// Successful codec opens
  pub fn opens(&self) -> u32 {
    self.inner.borrow().opens
  }

  pub fn closes(&self) -> u32 {
    self.inner.borrow().closes
  }

  pub fn flushes(&self) -> u32 {
    self.inner.borrow().flushes
  }

  /// Packets submitted, drain packets included
  pub fn packets(&self) -> u32 {
    self.inner.borrow().packets
  }

  pub fn drain_packets(&self) -> u32 {
    self.inner.borrow().drain_packets
  }

  /// Extradata passed to the most recent open
  pub fn last_extradata(&self) -> Vec<u8> {
    self.inner.borrow().extradata.clone()
  }

  pub fn last_configured(&self) -> Option<(CodecId, Geometry)> {
    self.inner.borrow().configured
  }

  pub fn last_options(&self) -> Option<OpenOptions> {
    self.inner.borrow().options
  }

  /// Timestamps of submitted data packets, in order
  pub fn sent_timestamps(&self) -> Vec<i64> {
    self.inner.borrow().sent_timestamps.clone()
  }
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Script {
  delay: usize,
  no_decoder: bool,
  fail_alloc: bool,
  fail_frame_alloc: bool,
  fail_open: bool,
  fail_send: bool,
  fail_receive: bool,
  format: Option<PixelFormat>,
  frame_geometry: Option<Geometry>,
  geometry_switch: Option<(u64, Geometry)>,
  keyframe_interval: u64,
  no_timestamps: bool,
  no_best_effort: bool,
}

/// Deterministic in-memory decoder engine
#[derive(Debug, Default)]
pub struct ScriptedEngine {
  script: Script,
  stats: ScriptedStats,
}

impl ScriptedEngine {
  pub fn new() -> Self {
    Self::default()
  }

  /// Shared counters of this engine
  pub fn stats(&self) -> ScriptedStats {
    self.stats.clone()
  }

  /// Hold `frames` pictures back until the stream is drained
  pub fn with_delay(mut self, frames: usize) -> Self {
    self.script.delay = frames;
    self
  }

  /// Produce pictures at `geometry` instead of the configured one
  pub fn with_frame_geometry(mut self, geometry: Geometry) -> Self {
    self.script.frame_geometry = Some(geometry);
    self
  }

  /// Switch picture geometry starting with picture number `after`
  pub fn with_geometry_switch(mut self, after: u64, geometry: Geometry) -> Self {
    self.script.geometry_switch = Some((after, geometry));
    self
  }

  pub fn with_format(mut self, format: PixelFormat) -> Self {
    self.script.format = Some(format);
    self
  }

  /// Mark every `interval`-th picture as keyframe, starting with the first
  pub fn with_keyframe_interval(mut self, interval: u64) -> Self {
    self.script.keyframe_interval = interval;
    self
  }

  /// Produce pictures without any timestamp
  pub fn without_timestamps(mut self) -> Self {
    self.script.no_timestamps = true;
    self
  }

  /// Produce pictures from an engine that computes no best-effort timestamp
  pub fn without_best_effort(mut self) -> Self {
    self.script.no_best_effort = true;
    self
  }

  pub fn without_decoder(mut self) -> Self {
    self.script.no_decoder = true;
    self
  }

  pub fn failing_alloc(mut self) -> Self {
    self.script.fail_alloc = true;
    self
  }

  pub fn failing_frame_alloc(mut self) -> Self {
    self.script.fail_frame_alloc = true;
    self
  }

  pub fn failing_open(mut self) -> Self {
    self.script.fail_open = true;
    self
  }

  pub fn failing_send(mut self) -> Self {
    self.script.fail_send = true;
    self
  }

  pub fn failing_receive(mut self) -> Self {
    self.script.fail_receive = true;
    self
  }
}

impl DecoderEngine for ScriptedEngine {
  type Context = ScriptedContext;
  type Scaler = SoftwareScaler;

  fn alloc_context(&mut self) -> Option<Self::Context> {
    if self.script.fail_alloc {
      return None;
    }
    self.stats.inner.borrow_mut().contexts += 1;
    Some(ScriptedContext {
      script: self.script.clone(),
      stats: self.stats.clone(),
      codec: CodecId::None,
      geometry: Geometry::default(),
      opened: false,
      draining: false,
      pending: VecDeque::new(),
      produced: 0,
    })
  }

  fn find_decoder(&self, codec: CodecId) -> Option<DecoderDescriptor> {
    if self.script.no_decoder || codec == CodecId::None {
      return None;
    }
    Some(DecoderDescriptor {
      codec,
      name: codec.name().to_string(),
      capabilities: DecoderCapabilities {
        delay: self.script.delay > 0,
      },
    })
  }

  fn create_scaler(&mut self, key: &ConversionKey) -> Option<Self::Scaler> {
    SoftwareScaler::new(key)
  }
}

/// Context of [`ScriptedEngine`]
#[derive(Debug)]
pub struct ScriptedContext {
  script: Script,
  stats: ScriptedStats,
  codec: CodecId,
  geometry: Geometry,
  opened: bool,
  draining: bool,
  pending: VecDeque<ScriptedFrame>,
  produced: u64,
}

impl ScriptedContext {
  fn picture(&mut self, packet: &Packet<'_>) -> ScriptedFrame {
    let index = self.produced;
    self.produced += 1;

    let mut geometry = self.script.frame_geometry.unwrap_or(self.geometry);
    if let Some((after, switched)) = self.script.geometry_switch {
      if index >= after {
        geometry = switched;
      }
    }
    let format = self.script.format.unwrap_or(PixelFormat::Yuv420p);

    let mut frame = ScriptedFrame::filled(geometry, format, (index % 256) as u8);
    frame.key_frame = match self.script.keyframe_interval {
      0 => index == 0,
      interval => index % interval == 0,
    };
    if !self.script.no_timestamps {
      frame.pts = packet.pts();
      frame.dts = packet.dts();
      frame.best_effort = packet.pts();
    }
    frame.supports_best_effort = !self.script.no_best_effort;
    frame
  }
}

impl DecoderContext for ScriptedContext {
  type Frame = ScriptedFrame;
  type PacketHolder = ();

  fn configure(&mut self, codec: CodecId, geometry: Geometry) {
    self.codec = codec;
    self.geometry = geometry;
    self.stats.inner.borrow_mut().configured = Some((codec, geometry));
  }

  fn geometry(&self) -> Geometry {
    self.geometry
  }

  fn open(
    &mut self,
    _decoder: &DecoderDescriptor,
    options: &OpenOptions,
    extradata: &[u8],
  ) -> Result<(), EngineError> {
    if self.script.fail_open {
      return Err(EngineError::failed(AVERROR_EINVAL, "Invalid argument"));
    }
    let mut counters = self.stats.inner.borrow_mut();
    counters.opens += 1;
    counters.extradata = extradata.to_vec();
    counters.options = Some(*options);
    self.opened = true;
    Ok(())
  }

  fn alloc_frame(&mut self) -> Option<Self::Frame> {
    (!self.script.fail_frame_alloc).then(ScriptedFrame::default)
  }

  fn alloc_packet(&mut self) -> Option<Self::PacketHolder> {
    Some(())
  }

  fn send_packet(&mut self, _holder: &mut (), packet: &Packet<'_>) -> Result<(), EngineError> {
    if !self.opened {
      return Err(EngineError::failed(AVERROR_EINVAL, "Invalid argument"));
    }
    self.stats.inner.borrow_mut().packets += 1;

    if packet.size() == 0 {
      self.stats.inner.borrow_mut().drain_packets += 1;
      self.draining = true;
      return Ok(());
    }
    if self.draining {
      return Err(EngineError::Eof);
    }
    if let Some(pts) = packet.pts() {
      self.stats.inner.borrow_mut().sent_timestamps.push(pts);
    }
    if self.script.fail_send {
      return Err(EngineError::failed(
        AVERROR_INVALIDDATA,
        "Invalid data found when processing input",
      ));
    }

    let frame = self.picture(packet);
    self.pending.push_back(frame);
    Ok(())
  }

  fn receive_frame(&mut self, frame: &mut Self::Frame) -> Result<(), EngineError> {
    if self.script.fail_receive {
      return Err(EngineError::failed(
        AVERROR_INVALIDDATA,
        "Invalid data found when processing input",
      ));
    }
    let hold = if self.draining { 0 } else { self.script.delay };
    if self.pending.len() > hold {
      if let Some(next) = self.pending.pop_front() {
        *frame = next;
        return Ok(());
      }
    }
    if self.draining {
      Err(EngineError::Eof)
    } else {
      Err(EngineError::Again)
    }
  }

  fn flush_buffers(&mut self) {
    self.pending.clear();
    self.draining = false;
    self.stats.inner.borrow_mut().flushes += 1;
  }

  fn close(&mut self) {
    if self.opened {
      self.opened = false;
      self.stats.inner.borrow_mut().closes += 1;
    }
  }
}

// ============================================================================
// Hardware hook
// ============================================================================

/// Hardware hook that attaches and optionally fails frame retrieval
#[derive(Debug, Default)]
pub struct ScriptedHwAccel {
  fail_get_frame: bool,
  attached: Rc<RefCell<(u32, u32)>>,
}

impl ScriptedHwAccel {
  pub fn new() -> Self {
    Self::default()
  }

  /// Fail every frame retrieval
  pub fn failing() -> Self {
    Self {
      fail_get_frame: true,
      ..Self::default()
    }
  }

  /// Shared (init, deinit) call counts
  pub fn calls(&self) -> Rc<RefCell<(u32, u32)>> {
    self.attached.clone()
  }
}

impl HwAccel<ScriptedContext> for ScriptedHwAccel {
  fn init(&mut self, _ctx: &mut ScriptedContext) -> bool {
    self.attached.borrow_mut().0 += 1;
    true
  }

  fn get_frame(
    &mut self,
    _ctx: &mut ScriptedContext,
    _frame: &mut ScriptedFrame,
  ) -> Result<(), EngineError> {
    if self.fail_get_frame {
      return Err(EngineError::failed(AVERROR_EINVAL, "Invalid argument"));
    }
    Ok(())
  }

  fn deinit(&mut self, _ctx: &mut ScriptedContext) {
    self.attached.borrow_mut().1 += 1;
  }

  fn name(&self) -> &str {
    "scripted"
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn open_context(engine: &mut ScriptedEngine) -> ScriptedContext {
    let mut ctx = engine.alloc_context().unwrap();
    ctx.configure(CodecId::H264, Geometry::new(4, 4));
    let decoder = engine.find_decoder(CodecId::H264).unwrap();
    ctx.open(&decoder, &OpenOptions::default(), &[]).unwrap();
    ctx
  }

  #[test]
  fn test_one_frame_per_packet() {
    let mut engine = ScriptedEngine::new();
    let mut ctx = open_context(&mut engine);
    let mut frame = ctx.alloc_frame().unwrap();

    ctx.send_packet(&mut (), &Packet::from_input(&[1, 2], 90)).unwrap();
    ctx.receive_frame(&mut frame).unwrap();
    assert_eq!(frame.pts, Some(90));
    assert!(frame.key_frame);
    assert_eq!(frame.geometry, Geometry::new(4, 4));
    assert_eq!(ctx.receive_frame(&mut frame), Err(EngineError::Again));
  }

  #[test]
  fn test_delay_holds_frames_until_drain() {
    let mut engine = ScriptedEngine::new().with_delay(2);
    assert!(engine.find_decoder(CodecId::H264).unwrap().capabilities.delay);
    let mut ctx = open_context(&mut engine);
    let mut frame = ctx.alloc_frame().unwrap();

    for ts in 0..2 {
      ctx.send_packet(&mut (), &Packet::from_input(&[0], ts)).unwrap();
      assert_eq!(ctx.receive_frame(&mut frame), Err(EngineError::Again));
    }

    ctx.send_packet(&mut (), &Packet::drain()).unwrap();
    ctx.receive_frame(&mut frame).unwrap();
    assert_eq!(frame.pts, Some(0));
    ctx.receive_frame(&mut frame).unwrap();
    assert_eq!(frame.pts, Some(1));
    assert_eq!(ctx.receive_frame(&mut frame), Err(EngineError::Eof));
  }

  #[test]
  fn test_flush_discards_pending() {
    let mut engine = ScriptedEngine::new().with_delay(1);
    let stats = engine.stats();
    let mut ctx = open_context(&mut engine);
    let mut frame = ctx.alloc_frame().unwrap();

    ctx.send_packet(&mut (), &Packet::from_input(&[0], 0)).unwrap();
    ctx.flush_buffers();
    ctx.send_packet(&mut (), &Packet::drain()).unwrap();
    assert_eq!(ctx.receive_frame(&mut frame), Err(EngineError::Eof));
    assert_eq!(stats.flushes(), 1);
  }
}
