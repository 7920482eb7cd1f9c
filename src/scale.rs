//! # 缩放模块
//!
//! ## 设计思路
//!
//! 缩放级别以百分比表示（100 = 1x）。逻辑尺寸与像素尺寸之间的换算统一为
//! `round(v * to / from)`；栅格缩放提供两种方式：
//!
//! - 最近邻：保持位深、调色板与颜色键，适合图标类像素画
//! - 平滑：转 RGBA8 后用 `fast_image_resize` 卷积缩放，失败时回退 `image::imageops`
//!
//! ## 实现思路
//!
//! 平滑缩放的输出是 24 位直接颜色栅格；源图有任何透明信息时附带逐像素 alpha。
//! 带遮罩或颜色键的栅格无论配置如何都走最近邻，透明区域保持二值。

use fast_image_resize as fr;
use image::{ImageBuffer, Rgba};

use crate::ImageError;
use crate::config::{ResizeFilter, ScaleMethod};
use crate::raster::{Raster, TransparencyKind};

/// 参考缩放级别（逻辑单位）。
pub const REFERENCE_ZOOM: u32 = 100;

/// 按缩放级别换算一个尺寸：`round(v * to / from)`，整数运算，半数向上取整。
pub fn scale_dimension(value: u32, from_zoom: u32, to_zoom: u32) -> u32 {
    if from_zoom == to_zoom || from_zoom == 0 {
        return value;
    }
    let (from, to) = (from_zoom as u64, to_zoom as u64);
    let scaled = (value as u64 * to + from / 2) / from;
    scaled.min(u32::MAX as u64) as u32
}

/// 按缩放级别换算宽高，结果至少为 1。
pub fn scale_size(width: u32, height: u32, from_zoom: u32, to_zoom: u32) -> (u32, u32) {
    (
        scale_dimension(width, from_zoom, to_zoom).max(1),
        scale_dimension(height, from_zoom, to_zoom).max(1),
    )
}

/// 将栅格从 `from_zoom` 缩放到 `to_zoom`。
pub fn scale_raster(
    raster: &Raster,
    from_zoom: u32,
    to_zoom: u32,
    method: ScaleMethod,
    filter: ResizeFilter,
) -> Result<Raster, ImageError> {
    let (width, height) = scale_size(raster.width(), raster.height(), from_zoom, to_zoom);
    if (width, height) == (raster.width(), raster.height()) {
        return Ok(raster.clone());
    }

    log::debug!(
        "🧩 栅格缩放：{}x{} -> {}x{}（{}% -> {}%，{:?}）",
        raster.width(),
        raster.height(),
        width,
        height,
        from_zoom,
        to_zoom,
        method
    );

    // 遮罩与颜色键必须保持二值
    let method = match raster.transparency_kind() {
        TransparencyKind::Mask | TransparencyKind::ColorKey => ScaleMethod::Nearest,
        _ => method,
    };

    match method {
        ScaleMethod::Nearest => raster.scaled_to(width, height),
        ScaleMethod::Smooth => smooth_resize(raster, width, height, filter),
    }
}

fn smooth_resize(raster: &Raster, width: u32, height: u32, filter: ResizeFilter) -> Result<Raster, ImageError> {
    let keep_alpha = raster.has_transparency();
    let rgba = raster.to_rgba8();

    let resized = match resize_with_fast_image_resize(raster.width(), raster.height(), rgba.clone(), width, height, filter)
    {
        Ok(resized) => resized,
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::imageops::resize：{}", err);
            let src = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(raster.width(), raster.height(), rgba)
                .ok_or_else(|| ImageError::InvalidArgument("RGBA 缓冲长度异常".to_string()))?;
            image::imageops::resize(&src, width, height, filter.to_image_filter()).into_raw()
        }
    };

    Raster::from_rgba8(width, height, &resized, keep_alpha)
}

fn resize_with_fast_image_resize(
    src_width: u32,
    src_height: u32,
    rgba: Vec<u8>,
    target_width: u32,
    target_height: u32,
    filter: ResizeFilter,
) -> Result<Vec<u8>, ImageError> {
    let src_image = fr::images::Image::from_vec_u8(src_width, src_height, rgba, fr::PixelType::U8x4)
        .map_err(|e| ImageError::InvalidArgument(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(filter.to_fast_filter()));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ImageError::InvalidArgument(format!("fast_image_resize 执行失败：{}", e)))?;

    Ok(dst_image.into_vec())
}
