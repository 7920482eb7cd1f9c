//! 透明遮罩：从遮罩数据或透明像素生成二值遮罩，以及任意位深遮罩图到 1 位的转换。

use super::{Raster, Rgb, bytes_per_line};
use crate::ImageError;

/// 栅格携带的透明信息类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransparencyKind {
    None,
    /// 1 位遮罩（图标）。
    Mask,
    /// 单一透明像素（颜色键）。
    ColorKey,
    /// 全局或逐像素 alpha。
    Alpha,
}

/// 二值透明遮罩，`true` 表示不透明。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransparencyMask {
    width: u32,
    height: u32,
    opaque: Vec<bool>,
}

impl TransparencyMask {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_opaque(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.opaque[y as usize * self.width as usize + x as usize]
    }
}

impl Raster {
    /// 透明信息类型，遮罩优先于颜色键，颜色键优先于 alpha。
    pub fn transparency_kind(&self) -> TransparencyKind {
        if self.mask_data.is_some() {
            TransparencyKind::Mask
        } else if self.transparent_pixel.is_some() {
            TransparencyKind::ColorKey
        } else if self.alpha.is_some() || self.alpha_data.is_some() {
            TransparencyKind::Alpha
        } else {
            TransparencyKind::None
        }
    }

    /// 生成二值透明遮罩；无遮罩且无透明像素时返回 `None`。
    pub fn transparency_mask(&self) -> Option<TransparencyMask> {
        let (width, height) = (self.width, self.height);
        let mut opaque = Vec::with_capacity(self.pixel_count());

        if let Some(mask_data) = self.mask_data.as_deref() {
            let bpl = bytes_per_line(width, 1, self.mask_pad);
            for y in 0..height as usize {
                for x in 0..width as usize {
                    let byte = mask_data[y * bpl + x / 8];
                    opaque.push((byte >> (7 - (x % 8))) & 1 != 0);
                }
            }
        } else if let Some(transparent) = self.transparent_pixel {
            for y in 0..height {
                for x in 0..width {
                    opaque.push(self.raw_pixel(x, y) != transparent);
                }
            }
        } else {
            return None;
        }

        Some(TransparencyMask {
            width,
            height,
            opaque,
        })
    }

    /// 附加一张遮罩图（任意位深），转换为 1 位遮罩数据。
    ///
    /// 遮罩图在“可见”处为白色、“透明”处为黑色；尺寸必须与源一致。
    pub fn with_mask_raster(self, mask: &Raster) -> Result<Self, ImageError> {
        if mask.width != self.width || mask.height != self.height {
            return Err(ImageError::InvalidArgument(format!(
                "源图与遮罩尺寸不一致：{}x{} / {}x{}",
                self.width, self.height, mask.width, mask.height
            )));
        }
        let (data, pad) = convert_mask(mask);
        self.with_mask_data(data, pad)
    }
}

/// 将任意位深的遮罩图转换为 1 位扫描行数据。
///
/// 1 位遮罩直接沿用原始位；其他位深按颜色判定：黑色透明，其余不透明。
pub(crate) fn convert_mask(mask: &Raster) -> (Vec<u8>, u32) {
    if mask.depth == 1 {
        return (mask.data.clone(), mask.scanline_pad);
    }

    let pad = 1;
    let bpl = bytes_per_line(mask.width, 1, pad);
    let mut data = vec![0u8; bpl * mask.height as usize];
    for y in 0..mask.height {
        for x in 0..mask.width {
            let rgb = mask.palette.rgb_of(mask.raw_pixel(x, y));
            if rgb != Rgb::BLACK {
                data[y as usize * bpl + x as usize / 8] |= 0x80 >> (x % 8);
            }
        }
    }
    (data, pad)
}

#[cfg(test)]
mod tests {
    use super::super::Palette;
    use super::*;

    fn mask_palette() -> Palette {
        Palette::Indexed(vec![Rgb::BLACK, Rgb::WHITE])
    }

    fn indexed_2x2(pixels: [u32; 4]) -> Raster {
        let mut raster = Raster::new(2, 2, 4, mask_palette()).expect("raster");
        for (i, p) in pixels.iter().enumerate() {
            raster.set_pixel(i as u32 % 2, i as u32 / 2, *p);
        }
        raster
    }

    #[test]
    fn color_key_builds_mask() {
        let raster = indexed_2x2([0, 1, 1, 0]).with_transparent_pixel(1);
        let mask = raster.transparency_mask().expect("mask");

        assert!(mask.is_opaque(0, 0));
        assert!(!mask.is_opaque(1, 0));
        assert!(!mask.is_opaque(0, 1));
        assert!(mask.is_opaque(1, 1));
        assert_eq!(raster.transparency_kind(), TransparencyKind::ColorKey);
    }

    #[test]
    fn mask_raster_overrides_color_key() {
        let mask = indexed_2x2([1, 1, 0, 1]);
        let raster = indexed_2x2([0, 0, 0, 0])
            .with_transparent_pixel(0)
            .with_mask_raster(&mask)
            .expect("mask attaches");

        let bits = raster.transparency_mask().expect("mask");
        assert!(bits.is_opaque(0, 0));
        assert!(bits.is_opaque(1, 0));
        assert!(!bits.is_opaque(0, 1));
        assert!(bits.is_opaque(1, 1));
        assert_eq!(raster.transparency_kind(), TransparencyKind::Mask);
    }

    #[test]
    fn mask_raster_size_mismatch_is_rejected() {
        let mask = Raster::new(3, 2, 1, mask_palette()).expect("mask");
        let result = indexed_2x2([0; 4]).with_mask_raster(&mask);

        assert!(matches!(result, Err(ImageError::InvalidArgument(_))));
    }

    #[test]
    fn no_transparency_means_no_mask() {
        assert!(indexed_2x2([0; 4]).transparency_mask().is_none());
    }
}
