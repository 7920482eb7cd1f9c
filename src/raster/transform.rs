//! 栅格变换：最近邻缩放、与直通（非预乘）RGBA8 之间的互转。

use super::{DEFAULT_SCANLINE_PAD, Palette, Raster, bytes_per_line};
use crate::ImageError;

impl Raster {
    /// 最近邻缩放到 `width x height`。
    ///
    /// 保留位深、调色板、透明像素与全局 alpha；逐像素 alpha 与遮罩按同样的采样缩放。
    pub fn scaled_to(&self, width: u32, height: u32) -> Result<Raster, ImageError> {
        let mut scaled = Raster::new(width, height, self.depth, self.palette.clone())?
            .with_byte_order(self.byte_order);
        scaled.transparent_pixel = self.transparent_pixel;
        scaled.alpha = self.alpha;

        let src_x = |x: u32| ((x as u64 * self.width as u64) / width as u64) as u32;
        let src_y = |y: u32| ((y as u64 * self.height as u64) / height as u64) as u32;

        for y in 0..height {
            let sy = src_y(y);
            for x in 0..width {
                scaled.write_raw_pixel(x, y, self.raw_pixel(src_x(x), sy));
            }
        }

        if let Some(alpha_data) = self.alpha_data.as_deref() {
            let mut out = Vec::with_capacity(width as usize * height as usize);
            for y in 0..height {
                let row = src_y(y) as usize * self.width as usize;
                for x in 0..width {
                    out.push(alpha_data[row + src_x(x) as usize]);
                }
            }
            scaled.alpha_data = Some(out);
        }

        let mask = match self.mask_data {
            Some(_) => self.transparency_mask(),
            None => None,
        };
        if let Some(mask) = mask {
            let bpl = bytes_per_line(width, 1, 1);
            let mut out = vec![0u8; bpl * height as usize];
            for y in 0..height {
                let sy = src_y(y);
                for x in 0..width {
                    if mask.is_opaque(src_x(x), sy) {
                        out[y as usize * bpl + x as usize / 8] |= 0x80 >> (x % 8);
                    }
                }
            }
            scaled.mask_data = Some(out);
            scaled.mask_pad = 1;
        }

        Ok(scaled)
    }

    /// 导出为直通 RGBA8（行优先，每像素 4 字节）。
    ///
    /// alpha 取值优先级：遮罩/颜色键（0 或 255）→ 全局 alpha → 逐像素 alpha → 255。
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mask = self.transparency_mask();
        let mut out = Vec::with_capacity(self.pixel_count() * 4);

        for y in 0..self.height {
            for x in 0..self.width {
                let rgb = self.palette.rgb_of(self.raw_pixel(x, y));
                let alpha = match (&mask, self.alpha, self.alpha_data.as_deref()) {
                    (Some(mask), _, _) => {
                        if mask.is_opaque(x, y) {
                            255
                        } else {
                            0
                        }
                    }
                    (None, Some(alpha), _) => alpha,
                    (None, None, Some(data)) => data[y as usize * self.width as usize + x as usize],
                    (None, None, None) => 255,
                };
                out.extend_from_slice(&[rgb.red, rgb.green, rgb.blue, alpha]);
            }
        }

        out
    }

    /// 由直通 RGBA8 构造 24 位直接颜色栅格。
    ///
    /// `keep_alpha` 为 `true` 时 alpha 通道写入逐像素 alpha。
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8], keep_alpha: bool) -> Result<Raster, ImageError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(ImageError::InvalidArgument(format!(
                "RGBA 数据长度异常：{}（需要：{}）",
                rgba.len(),
                expected
            )));
        }

        let mut raster = Raster::new(width, height, 24, Palette::direct(0xFF0000, 0xFF00, 0xFF))?;
        let bpl = bytes_per_line(width, 24, DEFAULT_SCANLINE_PAD);
        let mut alpha = Vec::with_capacity(if keep_alpha { expected / 4 } else { 0 });

        for (y, row) in rgba.chunks_exact(width as usize * 4).enumerate() {
            let line = &mut raster.data[y * bpl..y * bpl + width as usize * 3];
            for (dst, src) in line.chunks_exact_mut(3).zip(row.chunks_exact(4)) {
                dst.copy_from_slice(&src[..3]);
                if keep_alpha {
                    alpha.push(src[3]);
                }
            }
        }

        if keep_alpha {
            raster.alpha_data = Some(alpha);
        }
        Ok(raster)
    }
}
