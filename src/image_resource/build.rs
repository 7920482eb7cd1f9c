//! 由栅格构建原生表面：分配 → 格式转换 → 透明度合成 → 标记脏区。

use crate::ImageError;
use crate::composite::{self, TransparencyRecord, TransparencySource};
use crate::convert::{self, channel_layout};
use crate::device::Device;
use crate::raster::{Raster, TransparencyKind};
use crate::surface::{NativeSurface, SurfaceFormat};

use super::ImageKind;

/// 构建完成、尚未安装到图片上的表面。
pub(crate) struct BuiltSurface {
    pub surface: Box<dyn NativeSurface>,
    pub kind: ImageKind,
}

pub(crate) fn allocate(device: &dyn Device, format: SurfaceFormat, width: u32, height: u32) -> Result<Box<dyn NativeSurface>, ImageError> {
    device
        .allocator()
        .create_surface(format, width, height)
        .ok_or_else(|| {
            ImageError::ResourceExhausted(format!("无法分配 {}x{} 原生表面（{:?}）", width, height, format))
        })
}

/// 由栅格构建原生表面。
///
/// 带任何透明信息的栅格使用 ARGB32，否则使用 RGB24。
pub(crate) fn build_surface(device: &dyn Device, raster: &Raster) -> Result<BuiltSurface, ImageError> {
    convert::validate_depth(raster)?;

    let (width, height) = (raster.width(), raster.height());
    let format = if raster.has_transparency() {
        SurfaceFormat::Argb32
    } else {
        SurfaceFormat::Rgb24
    };
    let mut surface = allocate(device, format, width, height)?;

    let layout = channel_layout();
    let stride = surface.stride();
    let mut buffer = convert::to_canonical(raster, stride, &layout)?;
    composite::apply(
        &mut buffer,
        width,
        height,
        stride,
        &layout,
        &TransparencySource::from_raster(raster),
    );

    surface.data_mut()[..buffer.len()].copy_from_slice(&buffer);
    surface.mark_dirty();

    let kind = match raster.transparency_kind() {
        TransparencyKind::Mask => ImageKind::Icon,
        _ => ImageKind::Bitmap,
    };

    log::debug!(
        "🧱 原生表面已生成：#{} {}x{} {:?} {:?}",
        surface.id(),
        width,
        height,
        format,
        kind
    );

    Ok(BuiltSurface { surface, kind })
}

/// 白色不透明空白表面。
pub(crate) fn blank_surface(device: &dyn Device, width: u32, height: u32) -> Result<BuiltSurface, ImageError> {
    let mut surface = allocate(device, SurfaceFormat::Rgb24, width, height)?;
    surface.data_mut().fill(0xFF);
    surface.mark_dirty();
    Ok(BuiltSurface {
        surface,
        kind: ImageKind::Bitmap,
    })
}

/// 按缩放后的栅格调整透明记录。
///
/// 颜色键与全局 alpha 与尺寸无关，原样保留；逐像素 alpha 取缩放后栅格的数据。
pub(crate) fn rescaled_record(base: &TransparencyRecord, scaled: &Raster) -> TransparencyRecord {
    TransparencyRecord {
        color_key: base.color_key,
        global_alpha: base.global_alpha,
        alpha_data: match base.alpha_data {
            Some(_) => scaled.alpha_data().map(<[u8]>::to_vec),
            None => None,
        },
    }
}
