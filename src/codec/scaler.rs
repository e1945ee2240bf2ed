//! Conversion into the fixed planar 4:2:0 output layout
//!
//! Every decoded picture leaves the component as I420: a full-resolution
//! luma plane followed by the U and V planes at half width and half height
//! (rounded up for odd dimensions). The conversion context is rebuilt only
//! when its [`ConversionKey`] changes.

use super::{CodecError, CodecResult, Geometry, Picture, PixelFormat};

/// Identity of a conversion context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversionKey {
  pub src: Geometry,
  pub src_format: PixelFormat,
  pub dst: Geometry,
}

impl ConversionKey {
  pub fn new(src: Geometry, src_format: PixelFormat, dst: Geometry) -> Self {
    Self {
      src,
      src_format,
      dst,
    }
  }

  /// Check if the conversion changes resolution
  pub fn is_scaling(&self) -> bool {
    self.src != self.dst
  }
}

/// A conversion context producing I420 from pictures of type `F`
pub trait Scale<F: Picture> {
  /// Convert `src` into `dst`, whose layout matches the key the context was
  /// built for
  fn scale(&mut self, src: &F, dst: &mut I420Planes<'_>) -> CodecResult<()>;
}

/// Single-entry cache of the current conversion context
#[derive(Debug)]
pub struct ConversionCache<S> {
  entry: Option<(ConversionKey, S)>,
}

impl<S> Default for ConversionCache<S> {
  fn default() -> Self {
    Self { entry: None }
  }
}

impl<S> ConversionCache<S> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Get the context for `key`, building a new one if the key changed
  ///
  /// A failed build leaves the cache empty and returns None.
  pub fn get_or_rebuild<B>(&mut self, key: ConversionKey, build: B) -> Option<&mut S>
  where
    B: FnOnce(&ConversionKey) -> Option<S>,
  {
    let stale = match &self.entry {
      Some((cached, _)) => *cached != key,
      None => true,
    };
    if stale {
      self.entry = None;
      tracing::debug!(
        target: "softvdec",
        "building conversion context {:?} {} -> I420 {}",
        key.src_format,
        key.src,
        key.dst
      );
      self.entry = Some((key, build(&key)?));
    }
    self.entry.as_mut().map(|(_, scaler)| scaler)
  }

  /// Key of the cached context, if any
  pub fn key(&self) -> Option<&ConversionKey> {
    self.entry.as_ref().map(|(key, _)| key)
  }

  /// Release the cached context
  pub fn clear(&mut self) {
    self.entry = None;
  }
}

/// Byte layout of one I420 picture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I420Layout {
  pub geometry: Geometry,
}

impl I420Layout {
  pub fn new(geometry: Geometry) -> Self {
    Self { geometry }
  }

  /// Luma row stride in bytes
  #[inline]
  pub fn luma_stride(&self) -> usize {
    self.geometry.width as usize
  }

  /// Chroma row stride in bytes
  #[inline]
  pub fn chroma_stride(&self) -> usize {
    self.geometry.width.div_ceil(2) as usize
  }

  #[inline]
  pub fn chroma_height(&self) -> usize {
    self.geometry.height.div_ceil(2) as usize
  }

  #[inline]
  pub fn luma_size(&self) -> usize {
    self.luma_stride() * self.geometry.height as usize
  }

  #[inline]
  pub fn chroma_size(&self) -> usize {
    self.chroma_stride() * self.chroma_height()
  }

  /// Offset of the U plane from the start of the buffer
  #[inline]
  pub fn u_offset(&self) -> usize {
    self.luma_size()
  }

  /// Offset of the V plane from the start of the buffer
  #[inline]
  pub fn v_offset(&self) -> usize {
    self.luma_size() + self.chroma_size()
  }

  #[inline]
  pub fn total_size(&self) -> usize {
    self.luma_size() + 2 * self.chroma_size()
  }
}

/// Mutable views of the three planes of an I420 destination buffer
#[derive(Debug)]
pub struct I420Planes<'a> {
  pub y: &'a mut [u8],
  pub u: &'a mut [u8],
  pub v: &'a mut [u8],
  pub layout: I420Layout,
}

impl<'a> I420Planes<'a> {
  /// Split `buf` into Y, U and V planes for `geometry`
  pub fn split(buf: &'a mut [u8], geometry: Geometry) -> CodecResult<Self> {
    let layout = I420Layout::new(geometry);
    let needed = layout.total_size();
    if buf.len() < needed {
      return Err(CodecError::BufferTooSmall {
        needed,
        available: buf.len(),
      });
    }
    let (y, rest) = buf[..needed].split_at_mut(layout.luma_size());
    let (u, v) = rest.split_at_mut(layout.chroma_size());
    Ok(Self { y, u, v, layout })
  }

  pub fn geometry(&self) -> Geometry {
    self.layout.geometry
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_layout_offsets() {
    let layout = I420Layout::new(Geometry::new(16, 8));
    assert_eq!(layout.luma_size(), 128);
    assert_eq!(layout.chroma_size(), 32);
    assert_eq!(layout.u_offset(), 128);
    assert_eq!(layout.v_offset(), 160);
    assert_eq!(layout.total_size(), 192);
  }

  #[test]
  fn test_odd_layout_rounds_chroma_up() {
    let layout = I420Layout::new(Geometry::new(5, 3));
    assert_eq!(layout.chroma_stride(), 3);
    assert_eq!(layout.chroma_height(), 2);
    assert_eq!(layout.total_size(), 15 + 12);
  }

  #[test]
  fn test_split_rejects_short_buffer() {
    let mut buf = vec![0u8; 100];
    let err = I420Planes::split(&mut buf, Geometry::new(16, 8)).unwrap_err();
    assert!(matches!(
      err,
      CodecError::BufferTooSmall {
        needed: 192,
        available: 100
      }
    ));
  }

  #[test]
  fn test_split_plane_sizes() {
    let mut buf = vec![0u8; 200];
    let planes = I420Planes::split(&mut buf, Geometry::new(16, 8)).unwrap();
    assert_eq!(planes.y.len(), 128);
    assert_eq!(planes.u.len(), 32);
    assert_eq!(planes.v.len(), 32);
  }

  #[test]
  fn test_cache_rebuilds_only_on_key_change() {
    let mut cache: ConversionCache<u32> = ConversionCache::new();
    let mut builds = 0;
    let key = ConversionKey::new(
      Geometry::new(64, 64),
      PixelFormat::Yuv420p,
      Geometry::new(64, 64),
    );

    for _ in 0..3 {
      let scaler = cache.get_or_rebuild(key, |_| {
        builds += 1;
        Some(builds)
      });
      assert_eq!(scaler.copied(), Some(1));
    }

    let other = ConversionKey::new(Geometry::new(64, 64), PixelFormat::Nv12, Geometry::new(64, 64));
    assert_eq!(
      cache
        .get_or_rebuild(other, |_| {
          builds += 1;
          Some(builds)
        })
        .copied(),
      Some(2)
    );
    assert_eq!(cache.key(), Some(&other));
  }

  #[test]
  fn test_key_scaling() {
    let same = ConversionKey::new(Geometry::new(8, 8), PixelFormat::Nv12, Geometry::new(8, 8));
    assert!(!same.is_scaling());
    let scaled = ConversionKey::new(Geometry::new(8, 8), PixelFormat::Nv12, Geometry::new(16, 8));
    assert!(scaled.is_scaling());
  }

  #[test]
  fn test_cache_failed_build_leaves_empty() {
    let mut cache: ConversionCache<u32> = ConversionCache::new();
    let key = ConversionKey::new(Geometry::new(8, 8), PixelFormat::Rgb24, Geometry::new(8, 8));
    assert!(cache.get_or_rebuild(key, |_| None).is_none());
    assert!(cache.key().is_none());
  }
}
