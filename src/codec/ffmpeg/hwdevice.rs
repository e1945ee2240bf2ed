//! Hardware-accelerated decoding through an FFmpeg device context
//!
//! The device is attached before the decoder is opened. Pictures decoded
//! into hardware surfaces are downloaded into system memory before they
//! reach the conversion stage.

use crate::codec::{CodecError, CodecResult, EngineError, HwAccel};
use crate::ffi::{
  self,
  accessors::{ffhwconfig_get_device_type, ffhwconfig_get_methods, ffhwconfig_get_pix_fmt},
  avcodec::{avcodec_find_decoder, avcodec_get_hw_config},
  avutil::av_buffer_unref,
  hw_config_method,
  hwaccel::{av_hwdevice_ctx_create, av_hwframe_transfer_data, hwdevice_type_name},
  AVBufferRef, AVHWDeviceType,
};
use std::ptr::NonNull;

use super::{FfmpegContext, FfmpegFrame};

/// Safe wrapper around FFmpeg hardware device context
pub struct HwDevice {
  ptr: NonNull<AVBufferRef>,
  device_type: AVHWDeviceType,
}

impl HwDevice {
  /// Create a new hardware device context on the default device
  pub fn new(device_type: AVHWDeviceType) -> CodecResult<Self> {
    let mut device_ctx: *mut AVBufferRef = std::ptr::null_mut();

    let ret = unsafe {
      av_hwdevice_ctx_create(
        &mut device_ctx,
        device_type.as_raw(),
        std::ptr::null(),
        std::ptr::null_mut(),
        0,
      )
    };
    ffi::check_error(ret)?;

    NonNull::new(device_ctx)
      .map(|ptr| Self { ptr, device_type })
      .ok_or_else(|| CodecError::HardwareError("Failed to create hardware device context".into()))
  }

  /// Get the raw pointer
  #[inline]
  pub fn as_ptr(&self) -> *mut AVBufferRef {
    self.ptr.as_ptr()
  }

  /// Get the device type
  #[inline]
  pub fn device_type(&self) -> AVHWDeviceType {
    self.device_type
  }
}

impl Drop for HwDevice {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      av_buffer_unref(&mut ptr);
    }
  }
}

// Hardware device contexts can be shared across threads
unsafe impl Send for HwDevice {}
unsafe impl Sync for HwDevice {}

impl std::fmt::Debug for HwDevice {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HwDevice")
      .field("type", &self.device_type)
      .field("name", &hwdevice_type_name(self.device_type))
      .finish()
  }
}

// ============================================================================
// Decoder hook
// ============================================================================

/// Hardware hook attaching one device type to the decoder context
pub struct HwDeviceAccel {
  device_type: AVHWDeviceType,
  device: Option<HwDevice>,
  /// Pixel format of hardware surfaces for the attached decoder
  hw_format: Option<i32>,
  /// Scratch frame receiving downloaded pictures
  download: Option<FfmpegFrame>,
}

impl HwDeviceAccel {
  pub fn new(device_type: AVHWDeviceType) -> Self {
    Self {
      device_type,
      device: None,
      hw_format: None,
      download: None,
    }
  }

  /// Hook for the platform's preferred device type
  pub fn preferred() -> Self {
    Self::new(ffi::hwaccel::PREFERRED_HW_DEVICE)
  }

  /// Find the surface format the decoder uses with this device type
  fn surface_format(&self, ctx: &FfmpegContext) -> Option<i32> {
    let codec = unsafe { avcodec_find_decoder(ctx.codec_id()) };
    if codec.is_null() {
      return None;
    }
    (0..)
      .map(|index| unsafe { avcodec_get_hw_config(codec, index) })
      .take_while(|config| !config.is_null())
      .find(|&config| unsafe {
        ffhwconfig_get_methods(config) & hw_config_method::HW_DEVICE_CTX != 0
          && ffhwconfig_get_device_type(config) == self.device_type.as_raw()
      })
      .map(|config| unsafe { ffhwconfig_get_pix_fmt(config) })
  }
}

impl HwAccel<FfmpegContext> for HwDeviceAccel {
  fn init(&mut self, ctx: &mut FfmpegContext) -> bool {
    if self.device_type == AVHWDeviceType::None {
      return false;
    }
    let Some(hw_format) = self.surface_format(ctx) else {
      tracing::debug!(
        target: "softvdec",
        "decoder has no {} configuration",
        hwdevice_type_name(self.device_type)
      );
      return false;
    };
    let device = match HwDevice::new(self.device_type) {
      Ok(device) => device,
      Err(err) => {
        tracing::info!(
          target: "softvdec",
          "{} device unavailable, decoding in software: {}",
          hwdevice_type_name(self.device_type),
          err
        );
        return false;
      }
    };

    ctx.set_hw_device(device.as_ptr());
    tracing::info!(
      target: "softvdec",
      "attached {} device",
      hwdevice_type_name(self.device_type)
    );
    self.device = Some(device);
    self.hw_format = Some(hw_format);
    true
  }

  fn get_frame(
    &mut self,
    _ctx: &mut FfmpegContext,
    frame: &mut FfmpegFrame,
  ) -> Result<(), EngineError> {
    if self.hw_format != Some(frame.raw_format()) {
      return Ok(());
    }

    if self.download.is_none() {
      self.download = Some(FfmpegFrame::new().map_err(allocation_error)?);
    }
    let Some(download) = self.download.as_mut() else {
      return Ok(());
    };

    let ret = unsafe { av_hwframe_transfer_data(download.as_mut_ptr(), frame.as_ptr(), 0) };
    if let Err(err) = ffi::check_engine(ret) {
      download.unref();
      return Err(err);
    }
    frame.replace_with(download).map_err(allocation_error)
  }

  fn deinit(&mut self, ctx: &mut FfmpegContext) {
    ctx.clear_hw_device();
    self.device = None;
    self.hw_format = None;
    self.download = None;
  }

  fn name(&self) -> &str {
    hwdevice_type_name(self.device_type)
  }
}

fn allocation_error(err: CodecError) -> EngineError {
  EngineError::failed(ffi::error::AVERROR_ENOMEM, err.to_string())
}

impl std::fmt::Debug for HwDeviceAccel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HwDeviceAccel")
      .field("device_type", &self.device_type)
      .field("attached", &self.device.is_some())
      .finish()
  }
}
