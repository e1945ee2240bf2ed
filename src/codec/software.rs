//! Pure-Rust conversion of common YUV layouts into I420
//!
//! Handles the layouts software decoders actually emit. Resolution changes
//! are not supported here; a key that needs scaling or an unknown format
//! fails to build, which the component reports as a conversion error.

use super::{
  CodecError, CodecResult, ConversionKey, I420Planes, Picture, Plane, PixelFormat, Scale,
};

/// Chroma value of a neutral (grey) pixel
const NEUTRAL_CHROMA: u8 = 128;

/// Same-resolution planar/semi-planar to I420 converter
#[derive(Debug, Clone)]
pub struct SoftwareScaler {
  key: ConversionKey,
}

impl SoftwareScaler {
  /// Build a converter for `key`, None if the key needs scaling or the
  /// source format is unsupported
  pub fn new(key: &ConversionKey) -> Option<Self> {
    if key.is_scaling() || !Self::supports(key.src_format) {
      return None;
    }
    Some(Self { key: *key })
  }

  /// Check if the source format can be converted
  pub fn supports(format: PixelFormat) -> bool {
    matches!(
      format,
      PixelFormat::Yuv420p
        | PixelFormat::Yuvj420p
        | PixelFormat::Yuv422p
        | PixelFormat::Yuvj422p
        | PixelFormat::Yuv444p
        | PixelFormat::Yuvj444p
        | PixelFormat::Nv12
        | PixelFormat::Nv21
        | PixelFormat::Gray8
    )
  }

  pub fn key(&self) -> &ConversionKey {
    &self.key
  }
}

impl<F: Picture> Scale<F> for SoftwareScaler {
  fn scale(&mut self, src: &F, dst: &mut I420Planes<'_>) -> CodecResult<()> {
    if src.geometry() != self.key.src
      || src.format() != self.key.src_format
      || dst.geometry() != self.key.dst
    {
      return Err(CodecError::InvalidConfig(
        "Frame dimensions don't match scaler configuration".into(),
      ));
    }

    let width = self.key.src.width as usize;
    let height = self.key.src.height as usize;
    if width == 0 || height == 0 {
      return Err(CodecError::InvalidConfig("Empty picture".into()));
    }
    let cw = dst.layout.chroma_stride();
    let ch = dst.layout.chroma_height();

    copy_plane(&plane(src, 0)?, dst.y, width, height)?;

    match self.key.src_format {
      PixelFormat::Yuv420p | PixelFormat::Yuvj420p => {
        copy_plane(&plane(src, 1)?, dst.u, cw, ch)?;
        copy_plane(&plane(src, 2)?, dst.v, cw, ch)?;
      }
      PixelFormat::Yuv422p | PixelFormat::Yuvj422p => {
        halve_rows(&plane(src, 1)?, dst.u, cw, height)?;
        halve_rows(&plane(src, 2)?, dst.v, cw, height)?;
      }
      PixelFormat::Yuv444p | PixelFormat::Yuvj444p => {
        halve_both(&plane(src, 1)?, dst.u, width, height)?;
        halve_both(&plane(src, 2)?, dst.v, width, height)?;
      }
      PixelFormat::Nv12 => deinterleave(&plane(src, 1)?, dst.u, dst.v, cw, ch)?,
      PixelFormat::Nv21 => deinterleave(&plane(src, 1)?, dst.v, dst.u, cw, ch)?,
      PixelFormat::Gray8 => {
        dst.u.fill(NEUTRAL_CHROMA);
        dst.v.fill(NEUTRAL_CHROMA);
      }
      other => return Err(CodecError::UnsupportedPixelFormat(other)),
    }

    Ok(())
  }
}

fn plane<F: Picture>(src: &F, index: usize) -> CodecResult<Plane<'_>> {
  src
    .plane(index)
    .ok_or_else(|| CodecError::InvalidConfig(format!("Missing plane {}", index)))
}

fn row<'a>(plane: &Plane<'a>, y: usize, width: usize) -> CodecResult<&'a [u8]> {
  plane
    .row(y, width)
    .ok_or_else(|| CodecError::InvalidConfig(format!("Source plane too short at row {}", y)))
}

fn copy_plane(src: &Plane<'_>, dst: &mut [u8], width: usize, height: usize) -> CodecResult<()> {
  for (y, out) in dst.chunks_exact_mut(width).take(height).enumerate() {
    out.copy_from_slice(row(src, y, width)?);
  }
  Ok(())
}

/// 4:2:2 chroma to 4:2:0: average vertical pairs, width is already halved
fn halve_rows(src: &Plane<'_>, dst: &mut [u8], cw: usize, src_height: usize) -> CodecResult<()> {
  for (y, out) in dst.chunks_exact_mut(cw).enumerate() {
    let top = row(src, 2 * y, cw)?;
    let bottom = row(src, (2 * y + 1).min(src_height - 1), cw)?;
    for ((o, a), b) in out.iter_mut().zip(top).zip(bottom) {
      *o = ((*a as u16 + *b as u16 + 1) / 2) as u8;
    }
  }
  Ok(())
}

/// 4:4:4 chroma to 4:2:0: average each 2x2 block, clamping at the edges
fn halve_both(src: &Plane<'_>, dst: &mut [u8], width: usize, height: usize) -> CodecResult<()> {
  let cw = width.div_ceil(2);
  for (y, out) in dst.chunks_exact_mut(cw).enumerate() {
    let top = row(src, 2 * y, width)?;
    let bottom = row(src, (2 * y + 1).min(height - 1), width)?;
    for (x, o) in out.iter_mut().enumerate() {
      let x0 = 2 * x;
      let x1 = (x0 + 1).min(width - 1);
      let sum = top[x0] as u16 + top[x1] as u16 + bottom[x0] as u16 + bottom[x1] as u16;
      *o = ((sum + 2) / 4) as u8;
    }
  }
  Ok(())
}

/// Split an interleaved chroma plane into `first` and `second`
fn deinterleave(
  src: &Plane<'_>,
  first: &mut [u8],
  second: &mut [u8],
  cw: usize,
  ch: usize,
) -> CodecResult<()> {
  for y in 0..ch {
    let pairs = row(src, y, cw * 2)?;
    let a = &mut first[y * cw..(y + 1) * cw];
    let b = &mut second[y * cw..(y + 1) * cw];
    for (x, pair) in pairs.chunks_exact(2).enumerate() {
      a[x] = pair[0];
      b[x] = pair[1];
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::Geometry;

  struct TestPicture {
    geometry: Geometry,
    format: PixelFormat,
    planes: Vec<(Vec<u8>, usize)>,
  }

  impl Picture for TestPicture {
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
      false
    }
    fn pts(&self) -> Option<i64> {
      None
    }
    fn pkt_dts(&self) -> Option<i64> {
      None
    }
    fn best_effort_timestamp(&self) -> Option<i64> {
      None
    }
    fn plane(&self, index: usize) -> Option<Plane<'_>> {
      self.planes.get(index).map(|(data, stride)| Plane {
        data,
        stride: *stride,
      })
    }
  }

  fn convert(pic: &TestPicture) -> Vec<u8> {
    let key = ConversionKey::new(pic.geometry, pic.format, pic.geometry);
    let mut scaler = SoftwareScaler::new(&key).unwrap();
    let mut out = vec![0u8; pic.geometry.i420_size()];
    let mut planes = I420Planes::split(&mut out, pic.geometry).unwrap();
    scaler.scale(pic, &mut planes).unwrap();
    out
  }

  #[test]
  fn test_yuv420p_copy_honours_stride() {
    // 4x2 luma with 2 bytes of row padding
    let pic = TestPicture {
      geometry: Geometry::new(4, 2),
      format: PixelFormat::Yuv420p,
      planes: vec![
        (vec![1, 2, 3, 4, 0, 0, 5, 6, 7, 8, 0, 0], 6),
        (vec![10, 11], 2),
        (vec![20, 21], 2),
      ],
    };
    assert_eq!(convert(&pic), vec![1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 20, 21]);
  }

  #[test]
  fn test_nv12_deinterleaves() {
    let pic = TestPicture {
      geometry: Geometry::new(2, 2),
      format: PixelFormat::Nv12,
      planes: vec![(vec![1, 2, 3, 4], 2), (vec![50, 60], 2)],
    };
    assert_eq!(convert(&pic), vec![1, 2, 3, 4, 50, 60]);
  }

  #[test]
  fn test_nv21_swaps_chroma() {
    let pic = TestPicture {
      geometry: Geometry::new(2, 2),
      format: PixelFormat::Nv21,
      planes: vec![(vec![1, 2, 3, 4], 2), (vec![50, 60], 2)],
    };
    assert_eq!(convert(&pic), vec![1, 2, 3, 4, 60, 50]);
  }

  #[test]
  fn test_yuv422p_averages_rows() {
    let pic = TestPicture {
      geometry: Geometry::new(2, 2),
      format: PixelFormat::Yuv422p,
      planes: vec![(vec![0; 4], 2), (vec![10, 20], 1), (vec![100, 200], 1)],
    };
    assert_eq!(&convert(&pic)[4..], &[15, 150]);
  }

  #[test]
  fn test_yuv444p_averages_blocks() {
    let pic = TestPicture {
      geometry: Geometry::new(2, 2),
      format: PixelFormat::Yuv444p,
      planes: vec![
        (vec![0; 4], 2),
        (vec![10, 20, 30, 40], 2),
        (vec![0, 0, 0, 4], 2),
      ],
    };
    assert_eq!(&convert(&pic)[4..], &[25, 1]);
  }

  #[test]
  fn test_gray_fills_neutral_chroma() {
    let pic = TestPicture {
      geometry: Geometry::new(2, 2),
      format: PixelFormat::Gray8,
      planes: vec![(vec![9, 9, 9, 9], 2)],
    };
    assert_eq!(convert(&pic), vec![9, 9, 9, 9, 128, 128]);
  }

  #[test]
  fn test_unsupported_keys_fail_to_build() {
    let g = Geometry::new(16, 16);
    assert!(SoftwareScaler::new(&ConversionKey::new(g, PixelFormat::Rgb24, g)).is_none());
    assert!(SoftwareScaler::new(&ConversionKey::new(
      g,
      PixelFormat::Yuv420p,
      Geometry::new(8, 8)
    ))
    .is_none());
  }

  #[test]
  fn test_short_plane_is_an_error() {
    let pic = TestPicture {
      geometry: Geometry::new(4, 4),
      format: PixelFormat::Yuv420p,
      planes: vec![(vec![0; 8], 4), (vec![0; 4], 2), (vec![0; 4], 2)],
    };
    let key = ConversionKey::new(pic.geometry, pic.format, pic.geometry);
    let mut scaler = SoftwareScaler::new(&key).unwrap();
    let mut out = vec![0u8; pic.geometry.i420_size()];
    let mut planes = I420Planes::split(&mut out, pic.geometry).unwrap();
    assert!(scaler.scale(&pic, &mut planes).is_err());
  }
}
