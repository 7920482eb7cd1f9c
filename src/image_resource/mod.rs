//! # 图片资源模块
//!
//! ## 设计思路
//!
//! `Image` 独占持有一个原生表面（预乘 alpha 的 ARGB32 或不透明 RGB24），并记住：
//!
//! - 种类（位图 / 图标）与透明属性（颜色键、全局 alpha、逐像素 alpha）
//! - 像素来源（静态栅格或按缩放级别提供资源的供应方）
//! - 表面对应的缩放级别 `cached_zoom`
//! - 可能绑定的绘图上下文
//!
//! 生命周期：构造一次 → 任意次数原地刷新 → 释放一次。释放后除再次释放外，
//! 所有操作都返回 `UseAfterDispose`。`Drop` 时自动释放。
//!
//! ## 实现思路
//!
//! - `build`：栅格 → 原生表面（转换 + 合成）
//! - `export`：原生表面 → 栅格（反预乘）
//! - `refresh`：缩放级别变化时的重新生成
//! - `gc`：绘图上下文的绑定与失效
//!
//! 所有构造函数都在设备当前缩放级别下工作：静态栅格视为 100% 资源，先缩放再生成表面。

mod build;
mod export;
mod gc;
mod refresh;

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

use crate::ImageError;
use crate::composite::TransparencyRecord;
use crate::config::ScaleMethod;
use crate::convert::channel_layout;
use crate::decoder::DecodeError;
use crate::device::Device;
use crate::pipeline::PixelView;
use crate::raster::Raster;
use crate::resolution::{FileNameSupplier, RasterDataSupplier, ResolutionSource};
use crate::scale::{REFERENCE_ZOOM, scale_dimension, scale_raster, scale_size};
use crate::surface::{NativeSurface, SurfaceFormat};
use crate::variant::{Variant, apply_variant};

use build::{BuiltSurface, allocate, blank_surface, build_surface, rescaled_record};
use export::{binary_mask_from_alpha, export_surface};
use gc::GcState;

pub use gc::{Canvas, GraphicsContext};

/// 图片种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Bitmap,
    /// 由 1 位遮罩定义透明区域的图标。
    Icon,
}

/// 矩形区域。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// 缩放感知的图片资源。
pub struct Image {
    device: Rc<dyn Device>,
    kind: ImageKind,
    surface: Option<Box<dyn NativeSurface>>,
    width: u32,
    height: u32,
    record: TransparencyRecord,
    source: ResolutionSource,
    cached_zoom: u32,
    gc: Option<Rc<GcState>>,
    /// 当前表面由供应方的 100% 资源生成（精确或缩放）。
    from_reference_asset: bool,
}

impl Image {
    fn assemble(
        device: Rc<dyn Device>,
        built: BuiltSurface,
        record: TransparencyRecord,
        source: ResolutionSource,
        cached_zoom: u32,
        from_reference_asset: bool,
    ) -> Self {
        let (width, height) = (built.surface.width(), built.surface.height());
        log::info!(
            "✅ 图片已创建：#{} {}x{} 缩放 {}% 来源 {:?}",
            built.surface.id(),
            width,
            height,
            cached_zoom,
            source
        );
        Self {
            device,
            kind: built.kind,
            surface: Some(built.surface),
            width,
            height,
            record,
            source,
            cached_zoom,
            gc: None,
            from_reference_asset,
        }
    }

    /// 由 100% 栅格创建图片，按设备当前缩放级别缩放。
    ///
    /// # 示例
    /// ```rust
    /// use dpi_image::device::HostDevice;
    /// use dpi_image::image_resource::Image;
    /// use dpi_image::raster::{Palette, Raster, Rgb};
    ///
    /// let device = HostDevice::with_zoom(200)?;
    /// let raster = Raster::new(8, 8, 8, Palette::Indexed(vec![Rgb::WHITE]))?;
    /// let image = Image::from_raster(device.clone(), &raster)?;
    /// assert_eq!(image.bounds_in_pixels()?.width, 16);
    /// assert_eq!(image.bounds()?.width, 8);
    /// # Ok::<(), dpi_image::ImageError>(())
    /// ```
    pub fn from_raster(device: Rc<dyn Device>, raster: &Raster) -> Result<Self, ImageError> {
        let zoom = device.current_zoom();
        let scaled = scale_raster(
            raster,
            REFERENCE_ZOOM,
            zoom,
            device.scale_method(),
            device.resize_filter(),
        )?;
        let built = build_surface(device.as_ref(), &scaled)?;
        let record = rescaled_record(&TransparencyRecord::from_raster(raster), &scaled);
        Ok(Self::assemble(device, built, record, ResolutionSource::Static, zoom, false))
    }

    /// 由源栅格与遮罩图创建图标。
    ///
    /// 遮罩图可以是任意位深：黑色为透明，其余为不透明。两者尺寸必须一致。
    /// 源图与遮罩分别缩放到当前缩放级别后再合成，遮罩始终按最近邻采样。
    pub fn from_raster_and_mask(device: Rc<dyn Device>, source: &Raster, mask: &Raster) -> Result<Self, ImageError> {
        if (source.width(), source.height()) != (mask.width(), mask.height()) {
            return Err(ImageError::InvalidArgument(format!(
                "源图与遮罩尺寸不一致：{}x{} / {}x{}",
                source.width(),
                source.height(),
                mask.width(),
                mask.height()
            )));
        }

        let zoom = device.current_zoom();
        let filter = device.resize_filter();
        let scaled_source = scale_raster(
            &source.clone().without_transparency(),
            REFERENCE_ZOOM,
            zoom,
            device.scale_method(),
            filter,
        )?;
        let scaled_mask = scale_raster(mask, REFERENCE_ZOOM, zoom, ScaleMethod::Nearest, filter)?;
        let icon = scaled_source.with_mask_raster(&scaled_mask)?;

        let built = build_surface(device.as_ref(), &icon)?;
        let record = TransparencyRecord::from_raster(&icon);
        Ok(Self::assemble(device, built, record, ResolutionSource::Static, zoom, false))
    }

    /// 解码图片文件并创建图片。
    pub fn from_path(device: Rc<dyn Device>, path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        log::info!("📁 从文件创建图片：{}", path.display());
        let raster = device.decoder().decode_path(path)?;
        Self::from_raster(device, &raster)
    }

    /// 从字节流解码并创建图片。
    pub fn from_reader<R: Read>(device: Rc<dyn Device>, mut reader: R) -> Result<Self, ImageError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| DecodeError::IoFailure(e.to_string()))?;
        let raster = device.decoder().decode_bytes(&bytes)?;
        Self::from_raster(device, &raster)
    }

    /// 创建白色空白位图，`width`/`height` 为逻辑尺寸。
    pub fn blank(device: Rc<dyn Device>, width: u32, height: u32) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidArgument(format!(
                "图片尺寸必须为正数：{}x{}",
                width, height
            )));
        }
        let zoom = device.current_zoom();
        let (pixel_width, pixel_height) = scale_size(width, height, REFERENCE_ZOOM, zoom);
        let built = blank_surface(device.as_ref(), pixel_width, pixel_height)?;
        Ok(Self::assemble(
            device,
            built,
            TransparencyRecord::default(),
            ResolutionSource::Static,
            zoom,
            false,
        ))
    }

    /// 按矩形的宽高创建空白位图。
    pub fn from_bounds(device: Rc<dyn Device>, bounds: Rectangle) -> Result<Self, ImageError> {
        Self::blank(device, bounds.width, bounds.height)
    }

    /// 由已有图片派生拷贝 / 禁用态 / 灰度变体。
    ///
    /// 变体复制种类、尺寸、缓存缩放级别与透明属性（禁用态不保留颜色键），
    /// 来源为 `Static`。
    pub fn variant_of(device: Rc<dyn Device>, source: &Image, variant: Variant) -> Result<Self, ImageError> {
        let src = source.surface()?;
        let (width, height) = (src.width(), src.height());
        let format = src.format();

        let mut surface = allocate(device.as_ref(), format, width, height)?;
        let stride = surface.stride();
        {
            let dst = surface.data_mut();
            let src_data = src.data();
            let row_len = width as usize * 4;
            for y in 0..height as usize {
                let d = y * stride;
                let s = y * src.stride();
                dst[d..d + row_len].copy_from_slice(&src_data[s..s + row_len]);
            }
            apply_variant(
                &mut PixelView::new(dst, width, height, stride, channel_layout()),
                format.has_alpha(),
                variant,
                &device.disabled_palette(),
            );
        }
        surface.mark_dirty();

        let mut record = source.record.clone();
        if !variant.keeps_color_key() {
            record.color_key = None;
        }

        log::info!("🎨 生成图片变体：{} #{}", variant.as_str(), surface.id());
        let built = BuiltSurface {
            surface,
            kind: source.kind,
        };
        Ok(Self::assemble(
            device,
            built,
            record,
            ResolutionSource::Static,
            source.cached_zoom,
            false,
        ))
    }

    /// 由文件名供应方创建图片。
    pub fn from_file_supplier(device: Rc<dyn Device>, supplier: Rc<dyn FileNameSupplier>) -> Result<Self, ImageError> {
        Self::from_supplier(device, ResolutionSource::FileName(supplier))
    }

    /// 由栅格供应方创建图片。
    pub fn from_data_supplier(device: Rc<dyn Device>, supplier: Rc<dyn RasterDataSupplier>) -> Result<Self, ImageError> {
        Self::from_supplier(device, ResolutionSource::RasterData(supplier))
    }

    fn from_supplier(device: Rc<dyn Device>, source: ResolutionSource) -> Result<Self, ImageError> {
        let zoom = device.current_zoom();
        let asset = source
            .resolve(zoom, device.decoder())?
            .ok_or_else(|| ImageError::InvalidArgument("图片没有可用的供应方".to_string()))?;
        let base_record = TransparencyRecord::from_raster(&asset.raster);

        let (built, record) = if asset.exact {
            (build_surface(device.as_ref(), &asset.raster)?, base_record)
        } else {
            let scaled = scale_raster(
                &asset.raster,
                REFERENCE_ZOOM,
                zoom,
                device.scale_method(),
                device.resize_filter(),
            )?;
            let record = rescaled_record(&base_record, &scaled);
            (build_surface(device.as_ref(), &scaled)?, record)
        };

        let from_reference_asset = asset.zoom == REFERENCE_ZOOM;
        Ok(Self::assemble(device, built, record, source, zoom, from_reference_asset))
    }

    pub(crate) fn check_live(&self) -> Result<(), ImageError> {
        match self.surface {
            Some(_) => Ok(()),
            None => Err(ImageError::UseAfterDispose),
        }
    }

    pub(crate) fn surface(&self) -> Result<&dyn NativeSurface, ImageError> {
        self.surface.as_deref().ok_or(ImageError::UseAfterDispose)
    }

    pub(crate) fn surface_mut(&mut self) -> Result<&mut Box<dyn NativeSurface>, ImageError> {
        self.surface.as_mut().ok_or(ImageError::UseAfterDispose)
    }

    /// 安装新表面：先失效绘图上下文，再替换并释放旧表面。
    pub(crate) fn install(&mut self, built: BuiltSurface) {
        self.invalidate_gc();
        self.width = built.surface.width();
        self.height = built.surface.height();
        if let Some(old) = self.surface.replace(built.surface) {
            log::debug!("🗑️ 释放旧表面 #{}", old.id());
        }
    }

    /// 释放原生表面；重复调用无副作用。
    pub fn dispose(&mut self) {
        let Some(surface) = self.surface.take() else {
            return;
        };
        self.invalidate_gc();
        log::debug!("🗑️ 图片已释放 #{}", surface.id());
    }

    pub fn is_disposed(&self) -> bool {
        self.surface.is_none()
    }

    pub fn device(&self) -> &Rc<dyn Device> {
        &self.device
    }

    pub fn kind(&self) -> Result<ImageKind, ImageError> {
        self.check_live()?;
        Ok(self.kind)
    }

    /// 当前表面对应的缩放级别。
    pub fn cached_zoom(&self) -> Result<u32, ImageError> {
        self.check_live()?;
        Ok(self.cached_zoom)
    }

    pub fn source(&self) -> Result<&ResolutionSource, ImageError> {
        self.check_live()?;
        Ok(&self.source)
    }

    /// 颜色键（`0xRRGGBB`）。
    pub fn transparent_color_key(&self) -> Result<Option<u32>, ImageError> {
        self.check_live()?;
        Ok(self.record.color_key)
    }

    pub fn global_alpha(&self) -> Result<Option<u8>, ImageError> {
        self.check_live()?;
        Ok(self.record.global_alpha)
    }

    pub fn alpha_data(&self) -> Result<Option<&[u8]>, ImageError> {
        self.check_live()?;
        Ok(self.record.alpha_data.as_deref())
    }

    pub fn surface_format(&self) -> Result<SurfaceFormat, ImageError> {
        Ok(self.surface()?.format())
    }

    pub fn surface_id(&self) -> Result<u64, ImageError> {
        Ok(self.surface()?.id())
    }

    pub fn surface_stride(&self) -> Result<usize, ImageError> {
        Ok(self.surface()?.stride())
    }

    /// 原生表面的原始字节（预乘、宿主通道布局）。
    pub fn surface_bytes(&self) -> Result<&[u8], ImageError> {
        Ok(self.surface()?.data())
    }

    /// 100% 参考单位下的尺寸。
    pub fn bounds(&self) -> Result<Rectangle, ImageError> {
        self.check_live()?;
        Ok(Rectangle::new(
            0,
            0,
            scale_dimension(self.width, self.cached_zoom, REFERENCE_ZOOM),
            scale_dimension(self.height, self.cached_zoom, REFERENCE_ZOOM),
        ))
    }

    /// 设备像素尺寸。
    pub fn bounds_in_pixels(&self) -> Result<Rectangle, ImageError> {
        self.check_live()?;
        Ok(Rectangle::new(0, 0, self.width, self.height))
    }

    /// 导出当前表面。
    pub fn raster_at_current_zoom(&self) -> Result<Raster, ImageError> {
        export_surface(self.surface()?)
    }

    /// 导出指定缩放级别下的栅格。
    ///
    /// 与当前缩放级别相同时直接导出表面；供应方有精确资源时返回该资源；
    /// 否则按比例缩放（供应方从 100% 资源，静态图片从当前表面）。
    pub fn raster_at(&self, zoom: u32) -> Result<Raster, ImageError> {
        self.check_live()?;
        if zoom == 0 {
            return Err(ImageError::InvalidArgument("缩放级别必须为正数".to_string()));
        }
        if zoom == self.cached_zoom {
            return self.raster_at_current_zoom();
        }

        let method = self.device.scale_method();
        let filter = self.device.resize_filter();
        match self.source.resolve(zoom, self.device.decoder())? {
            Some(asset) if asset.exact => Ok(asset.raster),
            Some(asset) => scale_raster(&asset.raster, asset.zoom, zoom, method, filter),
            None => scale_raster(&self.export_for_rescale()?, self.cached_zoom, zoom, method, filter),
        }
    }

    /// 导出当前表面用于重新缩放；图标与带颜色键的图片把 alpha 收敛回 1 位遮罩。
    pub(crate) fn export_for_rescale(&self) -> Result<Raster, ImageError> {
        let exported = export_surface(self.surface()?)?;
        if self.kind == ImageKind::Icon || self.record.color_key.is_some() {
            binary_mask_from_alpha(exported)
        } else {
            Ok(exported)
        }
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl PartialEq for Image {
    /// 同一设备、同一颜色键，且来自同一供应方（或持有同一原生表面）。
    fn eq(&self, other: &Self) -> bool {
        if !Rc::ptr_eq(&self.device, &other.device) || self.record.color_key != other.record.color_key {
            return false;
        }
        match (&self.source, &other.source) {
            (ResolutionSource::Static, ResolutionSource::Static) => {
                self.surface.as_ref().map(|s| s.id()) == other.surface.as_ref().map(|s| s.id())
            }
            (a, b) => a.same_supplier(b),
        }
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.surface {
            Some(surface) => write!(f, "Image {{{}}}", surface.id()),
            None => f.write_str("Image {*DISPOSED*}"),
        }
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("cached_zoom", &self.cached_zoom)
            .field("source", &self.source)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
