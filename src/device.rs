//! # 宿主设备模块
//!
//! ## 设计思路
//!
//! 图片依赖宿主提供的几项能力：原生表面分配、当前缩放级别、主题色、解码器、缩放策略。
//! 这些能力收敛到 `Device` trait，图片通过 `Rc<dyn Device>` 共享同一台设备。
//!
//! ## 实现思路
//!
//! `HostDevice` 由 `DeviceConfig` 构造：内存表面分配器 + 带 LRU 缓存的 `image` 解码器；
//! 缩放级别放在 `Cell` 中，`set_zoom` 模拟显示器缩放变化（之后由调用方触发刷新）。

use std::cell::Cell;
use std::rc::Rc;

use crate::ImageError;
use crate::config::{DeviceConfig, ResizeFilter, ScaleMethod};
use crate::decoder::{CachingDecoder, ImageCrateDecoder, RasterDecoder};
use crate::raster::Rgb;
use crate::surface::{MemoryAllocator, SurfaceAllocator, SurfaceStats};
use crate::variant::DisabledPalette;

/// 图片使用的系统主题色。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemColor {
    /// 控件阴影色（禁用态暗色像素）。
    WidgetNormalShadow,
    /// 控件背景色（禁用态亮色像素）。
    WidgetBackground,
}

/// 宿主设备。
pub trait Device {
    fn allocator(&self) -> &dyn SurfaceAllocator;

    /// 当前设备缩放级别（百分比）。
    fn current_zoom(&self) -> u32;

    fn system_color(&self, color: SystemColor) -> Rgb;

    fn decoder(&self) -> &dyn RasterDecoder;

    fn scale_method(&self) -> ScaleMethod;

    fn resize_filter(&self) -> ResizeFilter;

    /// 禁用态使用的两种主题色。
    fn disabled_palette(&self) -> DisabledPalette {
        DisabledPalette {
            shadow: self.system_color(SystemColor::WidgetNormalShadow),
            background: self.system_color(SystemColor::WidgetBackground),
        }
    }
}

/// 基于内存表面的宿主设备。
pub struct HostDevice {
    config: DeviceConfig,
    zoom: Cell<u32>,
    allocator: MemoryAllocator,
    decoder: CachingDecoder<ImageCrateDecoder>,
}

impl HostDevice {
    /// 按配置创建设备。
    pub fn new(config: DeviceConfig) -> Result<Rc<Self>, ImageError> {
        config.validate()?;

        log::info!(
            "✅ 宿主设备已创建 - 缩放：{}% 缩放档位：{} 表面上限：{} 像素",
            config.initial_zoom,
            config.infer_scaling_profile().as_str(),
            config.max_surface_pixels
        );

        Ok(Rc::new(Self {
            zoom: Cell::new(config.initial_zoom),
            allocator: MemoryAllocator::new(config.max_surface_pixels),
            decoder: CachingDecoder::new(ImageCrateDecoder::new(), config.decode_cache_entries),
            config,
        }))
    }

    /// 默认配置、指定缩放级别的设备。
    pub fn with_zoom(zoom: u32) -> Result<Rc<Self>, ImageError> {
        Self::new(DeviceConfig {
            initial_zoom: zoom,
            ..DeviceConfig::default()
        })
    }

    /// 修改设备缩放级别（已有图片需调用 `refresh_for_zoom` 跟进）。
    pub fn set_zoom(&self, zoom: u32) -> Result<(), ImageError> {
        if zoom == 0 {
            return Err(ImageError::InvalidArgument("缩放级别必须为正数".to_string()));
        }
        let previous = self.zoom.replace(zoom);
        if previous != zoom {
            log::info!("🔍 设备缩放级别变化：{}% -> {}%", previous, zoom);
        }
        Ok(())
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn surface_stats(&self) -> SurfaceStats {
        self.allocator.stats()
    }

    /// 调整单个表面像素上限（模拟宿主资源紧张）。
    pub fn set_max_surface_pixels(&self, max_surface_pixels: u64) {
        self.allocator.set_max_surface_pixels(max_surface_pixels);
    }

    pub fn decode_cache(&self) -> &CachingDecoder<ImageCrateDecoder> {
        &self.decoder
    }
}

impl Device for HostDevice {
    fn allocator(&self) -> &dyn SurfaceAllocator {
        &self.allocator
    }

    fn current_zoom(&self) -> u32 {
        self.zoom.get()
    }

    fn system_color(&self, color: SystemColor) -> Rgb {
        match color {
            SystemColor::WidgetNormalShadow => self.config.shadow_color,
            SystemColor::WidgetBackground => self.config.background_color,
        }
    }

    fn decoder(&self) -> &dyn RasterDecoder {
        &self.decoder
    }

    fn scale_method(&self) -> ScaleMethod {
        self.config.scale_method
    }

    fn resize_filter(&self) -> ResizeFilter {
        self.config.resize_filter
    }
}
