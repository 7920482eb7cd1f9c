//! 按路径缓存解码结果（LRU）。
//!
//! 图片对象只在单线程内使用，缓存用 `RefCell` 包装即可。

use std::cell::{Cell, RefCell};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use lru::LruCache;

use super::{DecodeError, RasterDecoder};
use crate::raster::Raster;

/// 带 LRU 缓存的解码器包装。
pub struct CachingDecoder<D> {
    inner: D,
    cache: RefCell<LruCache<PathBuf, Raster>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl<D: RasterDecoder> CachingDecoder<D> {
    /// 创建缓存解码器，`capacity` 为 0 时按 1 处理。
    pub fn new(inner: D, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: RefCell::new(LruCache::new(capacity)),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits.get()
    }

    pub fn misses(&self) -> u64 {
        self.misses.get()
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    /// 清空缓存（文件在磁盘上被替换时使用）。
    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

impl<D: RasterDecoder> RasterDecoder for CachingDecoder<D> {
    fn decode_bytes(&self, bytes: &[u8]) -> Result<Raster, DecodeError> {
        self.inner.decode_bytes(bytes)
    }

    fn decode_path(&self, path: &Path) -> Result<Raster, DecodeError> {
        if let Some(raster) = self.cache.borrow_mut().get(path) {
            self.hits.set(self.hits.get() + 1);
            log::debug!("⚡ 解码缓存命中：{}", path.display());
            return Ok(raster.clone());
        }

        self.misses.set(self.misses.get() + 1);
        let raster = self.inner.decode_path(path)?;
        self.cache.borrow_mut().put(path.to_path_buf(), raster.clone());
        Ok(raster)
    }
}
