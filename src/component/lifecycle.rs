//! Decoder context lifecycle
//!
//! Owns the engine context and everything tied to one open session: the
//! reusable frame and packet holders, the conversion context, the
//! hardware-acceleration hook and the extradata buffer.

use super::error::{ComponentError, ComponentResult};
use super::extradata::ExtradataBuffer;
use super::state::{ErrorClass, ErrorLog};
use crate::codec::{
  CodecId, ConversionCache, DecoderContext, DecoderDescriptor, DecoderEngine, Geometry, HwAccel,
  OpenOptions,
};
use crate::config::DecoderConfig;

type FrameOf<E> = <<E as DecoderEngine>::Context as DecoderContext>::Frame;
type PacketOf<E> = <<E as DecoderEngine>::Context as DecoderContext>::PacketHolder;

/// Decoder context and its per-session resources
pub struct DecoderLifecycle<E: DecoderEngine> {
  pub(super) engine: E,
  pub(super) config: DecoderConfig,
  codec: CodecId,
  geometry: Geometry,
  pub(super) context: Option<E::Context>,
  pub(super) decoder: Option<DecoderDescriptor>,
  opened: bool,
  extradata: ExtradataBuffer,
  pub(super) frame: Option<FrameOf<E>>,
  pub(super) packet: Option<PacketOf<E>>,
  pub(super) scaler: ConversionCache<E::Scaler>,
  pub(super) hwaccel: Box<dyn HwAccel<E::Context>>,
  pub(super) hw_attached: bool,
  pub(super) errors: ErrorLog,
}

impl<E: DecoderEngine> DecoderLifecycle<E> {
  /// Create the lifecycle and allocate the initial context
  pub fn new(
    engine: E,
    config: DecoderConfig,
    hwaccel: Box<dyn HwAccel<E::Context>>,
  ) -> ComponentResult<Self> {
    let mut lifecycle = Self {
      engine,
      codec: config.codec,
      geometry: config.geometry,
      config,
      context: None,
      decoder: None,
      opened: false,
      extradata: ExtradataBuffer::new(),
      frame: None,
      packet: None,
      scaler: ConversionCache::new(),
      hwaccel,
      hw_attached: false,
      errors: ErrorLog::default(),
    };
    let codec = lifecycle.codec;
    lifecycle.initialize(codec)?;
    Ok(lifecycle)
  }

  /// Allocate a fresh context for `codec` at the current geometry
  pub fn initialize(&mut self, codec: CodecId) -> ComponentResult<()> {
    let mut context = self
      .engine
      .alloc_context()
      .ok_or(ComponentError::Allocation("decoder context"))?;
    context.configure(codec, self.geometry);
    self.codec = codec;
    self.context = Some(context);
    self.opened = false;
    tracing::debug!(
      target: "softvdec",
      "initialized {} decoder context at {}",
      codec,
      self.geometry
    );
    Ok(())
  }

  /// Open the decoder; does nothing if it is already open
  pub fn open(&mut self) -> ComponentResult<()> {
    if self.opened {
      return Ok(());
    }
    if self.context.is_none() {
      let codec = self.codec;
      self.initialize(codec)?;
    }

    // Configuration data is final from here on
    self.extradata.freeze();

    // The identity may have changed since the context was created
    let decoder = self
      .engine
      .find_decoder(self.codec)
      .ok_or(ComponentError::CodecNotFound(self.codec))?;

    let options = OpenOptions {
      fast: self.config.fast_decode,
      thread_count: self.config.thread_count,
      ..OpenOptions::default()
    };

    let context = self
      .context
      .as_mut()
      .ok_or(ComponentError::Allocation("decoder context"))?;

    self.hw_attached = self.hwaccel.init(context);
    if self.hw_attached {
      tracing::info!(
        target: "softvdec",
        "hardware acceleration attached: {}",
        self.hwaccel.name()
      );
    }

    tracing::debug!(
      target: "softvdec",
      "opening {} decoder ({} bytes of extradata)",
      decoder.name,
      self.extradata.len()
    );
    context
      .open(&decoder, &options, self.extradata.as_slice())
      .map_err(|source| {
        tracing::error!(target: "softvdec", "failed to open {} decoder: {}", self.codec, source);
        ComponentError::OpenFailed {
          codec: self.codec,
          source,
        }
      })?;
    self.opened = true;

    self.frame = Some(context.alloc_frame().ok_or(ComponentError::Allocation("frame"))?);
    self.packet = Some(context.alloc_packet().ok_or(ComponentError::Allocation("packet"))?);

    tracing::debug!(target: "softvdec", "opened {} decoder", decoder.name);
    self.decoder = Some(decoder);
    Ok(())
  }

  /// Tear down the context and every session resource; safe to call repeatedly
  pub fn close(&mut self) {
    if let Some(mut context) = self.context.take() {
      if self.opened {
        context.flush_buffers();
        context.close();
      }
      if self.hw_attached {
        self.hwaccel.deinit(&mut context);
        self.hw_attached = false;
      }
      tracing::debug!(target: "softvdec", "closed {} decoder context", self.codec);
    }
    self.extradata.release();
    self.opened = false;
    self.decoder = None;
    self.frame = None;
    self.packet = None;
    self.scaler.clear();
    self.errors.clear();
  }

  /// Close and re-initialize with the same codec
  pub fn reset(&mut self) -> ComponentResult<()> {
    let codec = self.codec;
    self.close();
    self.initialize(codec)
  }

  /// Drop buffered packets and frames, keeping the decoder open
  pub fn flush(&mut self) {
    if !self.opened {
      return;
    }
    if let Some(context) = self.context.as_mut() {
      context.flush_buffers();
      tracing::debug!(target: "softvdec", "flushed {} decoder", self.codec);
    }
  }

  /// Accumulate one codec configuration payload
  ///
  /// Configuration arriving after open is dropped and logged once per session.
  pub fn append_configuration_data(&mut self, bytes: &[u8]) -> ComponentResult<()> {
    if self.config.ignore_codec_config {
      tracing::debug!(
        target: "softvdec",
        "ignoring {} bytes of codec configuration",
        bytes.len()
      );
      return Ok(());
    }

    match self.extradata.append(bytes) {
      Err(ComponentError::ExtradataFrozen) => {
        if self.errors.log_once(ErrorClass::ExtradataFrozen) {
          tracing::warn!(
            target: "softvdec",
            "codec configuration after decoder open is ignored (logged only once)"
          );
        }
        Err(ComponentError::ExtradataFrozen)
      }
      other => other,
    }
  }

  /// Change the codec identity; takes effect at the next open
  pub fn set_codec(&mut self, codec: CodecId) {
    self.codec = codec;
    self.reconfigure();
  }

  /// Change the declared input geometry; takes effect at the next open
  pub fn set_dimensions(&mut self, geometry: Geometry) {
    self.geometry = geometry;
    self.reconfigure();
  }

  fn reconfigure(&mut self) {
    if self.opened {
      tracing::debug!(
        target: "softvdec",
        "decoder already open, {} {} applies after reset",
        self.codec,
        self.geometry
      );
      return;
    }
    if let Some(context) = self.context.as_mut() {
      context.configure(self.codec, self.geometry);
    }
  }

  #[inline]
  pub fn is_open(&self) -> bool {
    self.opened
  }

  #[inline]
  pub fn codec(&self) -> CodecId {
    self.codec
  }

  /// Declared input geometry
  #[inline]
  pub fn geometry(&self) -> Geometry {
    self.geometry
  }

  pub fn config(&self) -> &DecoderConfig {
    &self.config
  }

  pub fn extradata(&self) -> &ExtradataBuffer {
    &self.extradata
  }

  /// Decoder resolved at open
  pub fn decoder(&self) -> Option<&DecoderDescriptor> {
    self.decoder.as_ref()
  }

  /// Whether the open decoder holds frames back
  pub fn has_delay(&self) -> bool {
    self
      .decoder
      .as_ref()
      .is_some_and(|decoder| decoder.capabilities.delay)
  }

  pub fn engine(&self) -> &E {
    &self.engine
  }

  pub fn errors(&self) -> &ErrorLog {
    &self.errors
  }
}

impl<E: DecoderEngine> Drop for DecoderLifecycle<E> {
  fn drop(&mut self) {
    self.close();
  }
}

impl<E: DecoderEngine> std::fmt::Debug for DecoderLifecycle<E> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DecoderLifecycle")
      .field("codec", &self.codec)
      .field("geometry", &self.geometry)
      .field("opened", &self.opened)
      .field("extradata_len", &self.extradata.len())
      .finish()
  }
}
