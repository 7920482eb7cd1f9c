//! 原生表面导出为栅格：32 位直接颜色（`0x00RRGGBB`，高位在前），
//! ARGB32 表面额外导出反预乘后的逐像素 alpha。

use crate::ImageError;
use crate::composite::unpremultiply_argb;
use crate::convert::channel_layout;
use crate::pipeline::read_pixel;
use crate::raster::{DEFAULT_SCANLINE_PAD, Palette, Raster, bytes_per_line};
use crate::surface::NativeSurface;

pub(crate) fn export_surface(surface: &dyn NativeSurface) -> Result<Raster, ImageError> {
    let (width, height) = (surface.width(), surface.height());
    let stride = surface.stride();
    let has_alpha = surface.format().has_alpha();
    let layout = channel_layout();
    let src = surface.data();

    let bpl = width as usize * 4;
    let mut data = vec![0u8; bpl * height as usize];
    let mut alpha = Vec::with_capacity(if has_alpha { width as usize * height as usize } else { 0 });

    for y in 0..height {
        let row = y as usize * bpl;
        for x in 0..width {
            let mut px = read_pixel(src, stride, &layout, x, y);
            if has_alpha {
                alpha.push(px.alpha);
                px = unpremultiply_argb(px);
            }
            let offset = row + x as usize * 4;
            data[offset..offset + 4].copy_from_slice(&[0, px.red, px.green, px.blue]);
        }
    }

    let raster = Raster::with_data(
        width,
        height,
        32,
        Palette::direct(0xFF0000, 0xFF00, 0xFF),
        DEFAULT_SCANLINE_PAD,
        data,
    )?;

    if has_alpha {
        raster.with_alpha_data(alpha)
    } else {
        Ok(raster)
    }
}

/// 把逐像素 alpha 收敛为 1 位遮罩：alpha 非 0 即不透明。
///
/// 没有逐像素 alpha 的栅格原样返回。
pub(crate) fn binary_mask_from_alpha(raster: Raster) -> Result<Raster, ImageError> {
    let Some(alpha) = raster.alpha_data().map(<[u8]>::to_vec) else {
        return Ok(raster);
    };

    let (width, height) = (raster.width() as usize, raster.height() as usize);
    let bpl = bytes_per_line(raster.width(), 1, 1);
    let mut mask = vec![0u8; bpl * height];
    for y in 0..height {
        for x in 0..width {
            if alpha[y * width + x] != 0 {
                mask[y * bpl + x / 8] |= 0x80 >> (x % 8);
            }
        }
    }
    raster.without_transparency().with_mask_data(mask, 1)
}
