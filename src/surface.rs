//! # 原生表面模块
//!
//! ## 设计思路
//!
//! 原生绘图表面由宿主图形库提供，本 crate 只通过窄接口使用它：
//! 创建（格式 + 尺寸）、取原始字节缓冲与行跨度、标记脏区、销毁。
//! 销毁映射为 `Drop`，由 `Image` 独占持有 `Box<dyn NativeSurface>`。
//!
//! ## 实现思路
//!
//! - `SurfaceAllocator`：宿主分配器接口，失败返回 `None`，由调用方映射为 `ResourceExhausted`。
//! - `MemoryAllocator`：纯内存实现（每像素 4 字节、零填充），带像素上限与创建/销毁计数，
//!   既是默认宿主实现，也方便测试观察“刷新是否真的重建了表面”。

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// 原生表面像素格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceFormat {
    /// 不透明 24 位（每像素 4 字节，alpha 字节未使用）。
    Rgb24,
    /// 预乘 alpha 的 32 位 ARGB。
    Argb32,
}

impl SurfaceFormat {
    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Argb32)
    }
}

/// 宿主原生表面。
pub trait NativeSurface {
    /// 表面唯一标识（用于相等性比较与日志）。
    fn id(&self) -> u64;
    fn format(&self) -> SurfaceFormat;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// 每行字节数。
    fn stride(&self) -> usize;
    fn data(&self) -> &[u8];
    fn data_mut(&mut self) -> &mut [u8];
    /// 通知宿主像素已被直接改写。
    fn mark_dirty(&mut self);
}

/// 宿主表面分配器。
pub trait SurfaceAllocator {
    /// 创建表面；宿主无法分配时返回 `None`。
    fn create_surface(&self, format: SurfaceFormat, width: u32, height: u32) -> Option<Box<dyn NativeSurface>>;
}

/// 内存分配器统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub created: u64,
    pub destroyed: u64,
    pub dirty_marks: u64,
}

impl SurfaceStats {
    pub fn live(&self) -> u64 {
        self.created - self.destroyed
    }
}

#[derive(Debug, Default)]
struct Counters {
    created: Cell<u64>,
    destroyed: Cell<u64>,
    dirty_marks: Cell<u64>,
}

/// 纯内存表面分配器。
#[derive(Debug)]
pub struct MemoryAllocator {
    max_surface_pixels: Cell<u64>,
    counters: Rc<Counters>,
}

impl MemoryAllocator {
    pub fn new(max_surface_pixels: u64) -> Self {
        Self {
            max_surface_pixels: Cell::new(max_surface_pixels),
            counters: Rc::new(Counters::default()),
        }
    }

    /// 调整单个表面像素上限（超出时分配失败）。
    pub fn set_max_surface_pixels(&self, max_surface_pixels: u64) {
        self.max_surface_pixels.set(max_surface_pixels);
    }

    pub fn stats(&self) -> SurfaceStats {
        SurfaceStats {
            created: self.counters.created.get(),
            destroyed: self.counters.destroyed.get(),
            dirty_marks: self.counters.dirty_marks.get(),
        }
    }
}

impl SurfaceAllocator for MemoryAllocator {
    fn create_surface(&self, format: SurfaceFormat, width: u32, height: u32) -> Option<Box<dyn NativeSurface>> {
        let pixels = (width as u64).checked_mul(height as u64)?;
        if width == 0 || height == 0 || pixels > self.max_surface_pixels.get() {
            log::warn!(
                "⚠️ 表面分配被拒绝：{}x{}（上限：{} 像素）",
                width,
                height,
                self.max_surface_pixels.get()
            );
            return None;
        }

        let stride = width as usize * 4;
        let len = stride.checked_mul(height as usize)?;
        let counters = Rc::clone(&self.counters);
        counters.created.set(counters.created.get() + 1);

        Some(Box::new(MemorySurface {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            format,
            width,
            height,
            stride,
            data: vec![0; len],
            counters,
        }))
    }
}

/// 内存表面。
#[derive(Debug)]
pub struct MemorySurface {
    id: u64,
    format: SurfaceFormat,
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
    counters: Rc<Counters>,
}

impl NativeSurface for MemorySurface {
    fn id(&self) -> u64 {
        self.id
    }

    fn format(&self) -> SurfaceFormat {
        self.format
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn stride(&self) -> usize {
        self.stride
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn mark_dirty(&mut self) {
        self.counters.dirty_marks.set(self.counters.dirty_marks.get() + 1);
    }
}

impl Drop for MemorySurface {
    fn drop(&mut self) {
        self.counters.destroyed.set(self.counters.destroyed.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_tracks_create_and_destroy() {
        let allocator = MemoryAllocator::new(1024);

        let surface = allocator
            .create_surface(SurfaceFormat::Argb32, 4, 3)
            .expect("surface");
        assert_eq!(surface.stride(), 16);
        assert_eq!(surface.data().len(), 48);
        assert_eq!(allocator.stats().live(), 1);

        drop(surface);
        let stats = allocator.stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.destroyed, 1);
        assert_eq!(stats.live(), 0);
    }

    #[test]
    fn allocator_refuses_oversized_surface() {
        let allocator = MemoryAllocator::new(100);

        assert!(allocator.create_surface(SurfaceFormat::Rgb24, 11, 10).is_none());
        assert!(allocator.create_surface(SurfaceFormat::Rgb24, 10, 10).is_some());
        assert!(allocator.create_surface(SurfaceFormat::Rgb24, 0, 10).is_none());
    }

    #[test]
    fn surface_ids_are_unique() {
        let allocator = MemoryAllocator::new(100);
        let a = allocator.create_surface(SurfaceFormat::Rgb24, 1, 1).expect("a");
        let b = allocator.create_surface(SurfaceFormat::Rgb24, 1, 1).expect("b");

        assert_ne!(a.id(), b.id());
    }
}
