//! # 绘图上下文绑定
//!
//! 一张位图同一时间最多绑定一个活动的绘图上下文。上下文被丢弃、图片刷新或释放时，
//! 绑定失效；失效的上下文不能再绘制。
//!
//! 上下文与图片通过共享的 `GcState` 关联，图片不持有上下文本身。

use std::cell::Cell;
use std::rc::Rc;

use crate::ImageError;
use crate::convert::channel_layout;
use crate::pipeline::{Argb, PixelView};

use super::{Image, ImageKind};

#[derive(Debug)]
pub(crate) struct GcState {
    active: Cell<bool>,
}

impl GcState {
    pub(crate) fn deactivate(&self) {
        self.active.set(false);
    }
}

/// 绑定到图片的绘图上下文。
#[derive(Debug)]
pub struct GraphicsContext {
    state: Rc<GcState>,
}

impl GraphicsContext {
    /// 上下文是否仍可绘制。
    pub fn is_active(&self) -> bool {
        self.state.active.get()
    }
}

impl Drop for GraphicsContext {
    fn drop(&mut self) {
        self.state.deactivate();
    }
}

/// 绘图回调拿到的像素画布（预乘颜色，宿主通道布局）。
pub struct Canvas<'a> {
    view: PixelView<'a>,
}

impl Canvas<'_> {
    pub fn width(&self) -> u32 {
        self.view.width()
    }

    pub fn height(&self) -> u32 {
        self.view.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Argb> {
        self.view.pixel(x, y)
    }

    /// 写入一个像素，越界时忽略。
    pub fn set_pixel(&mut self, x: u32, y: u32, px: Argb) {
        self.view.set_pixel(x, y, px);
    }

    pub fn fill(&mut self, px: Argb) {
        self.view.for_each(|_, _, _| px);
    }
}

impl Image {
    /// 为位图绑定一个新的绘图上下文。
    ///
    /// 图标不能绑定；已有活动上下文时返回 `InvalidArgument`。
    pub fn acquire_gc(&mut self) -> Result<GraphicsContext, ImageError> {
        self.check_live()?;
        if self.kind != ImageKind::Bitmap {
            return Err(ImageError::InvalidArgument("只有位图可以绑定绘图上下文".to_string()));
        }
        if self.gc.as_ref().is_some_and(|state| state.active.get()) {
            return Err(ImageError::InvalidArgument("图片已绑定活动的绘图上下文".to_string()));
        }

        let state = Rc::new(GcState {
            active: Cell::new(true),
        });
        self.gc = Some(Rc::clone(&state));
        Ok(GraphicsContext { state })
    }

    /// 释放绘图上下文。
    pub fn release_gc(&mut self, gc: GraphicsContext) {
        if self.owns_gc(&gc) {
            self.gc = None;
        }
        drop(gc);
    }

    /// 当前是否绑定了活动的绘图上下文。
    pub fn has_active_gc(&self) -> bool {
        self.gc.as_ref().is_some_and(|state| state.active.get())
    }

    /// 通过绘图上下文直接修改表面像素，结束后标记脏区。
    pub fn draw<F>(&mut self, gc: &GraphicsContext, paint: F) -> Result<(), ImageError>
    where
        F: FnOnce(&mut Canvas<'_>),
    {
        self.check_live()?;
        if !gc.is_active() || !self.owns_gc(gc) {
            return Err(ImageError::InvalidArgument("绘图上下文已失效或不属于该图片".to_string()));
        }

        let surface = self.surface_mut()?;
        let (width, height, stride) = (surface.width(), surface.height(), surface.stride());
        let mut canvas = Canvas {
            view: PixelView::new(surface.data_mut(), width, height, stride, channel_layout()),
        };
        paint(&mut canvas);
        surface.mark_dirty();
        Ok(())
    }

    pub(crate) fn invalidate_gc(&mut self) {
        if let Some(state) = self.gc.take() {
            state.deactivate();
            log::debug!("🔌 绘图上下文已失效");
        }
    }

    fn owns_gc(&self, gc: &GraphicsContext) -> bool {
        self.gc.as_ref().is_some_and(|state| Rc::ptr_eq(state, &gc.state))
    }
}
