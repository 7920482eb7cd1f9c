//! # 栅格数据模型（raster）
//!
//! ## 设计思路
//!
//! `Raster` 描述解码器交付的“原始栅格”：尺寸、位深、调色板（索引或直接颜色掩码）、
//! 字节序，以及可选的透明信息（透明像素、全局 alpha、逐像素 alpha、1 位遮罩）。
//! 它与原生表面无关，只是转换流水线的输入与导出结果。
//!
//! ## 实现思路
//!
//! - 构造时校验尺寸与数据长度，之后字段只通过带校验的 `with_*` 方法修改。
//! - `pixel`：按位深读取原始像素值（子字节位深高位在前，16/24/32 位遵循字节序）。
//! - `mask`：透明遮罩的生成与转换。
//! - `transform`：最近邻缩放与 RGBA8 互转。

mod mask;
mod pixel;
mod transform;

use crate::ImageError;

pub use mask::{TransparencyKind, TransparencyMask};

/// 默认扫描行对齐字节数。
pub const DEFAULT_SCANLINE_PAD: u32 = 4;

/// 24 位 RGB 颜色。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// 打包为 `0xRRGGBB`。
    pub fn to_u32(self) -> u32 {
        (self.red as u32) << 16 | (self.green as u32) << 8 | self.blue as u32
    }

    pub fn from_u32(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }
}

/// 多字节像素的字节序。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    MsbFirst,
    LsbFirst,
}

/// 调色板：索引颜色表或直接颜色掩码。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Palette {
    Indexed(Vec<Rgb>),
    Direct {
        red_mask: u32,
        green_mask: u32,
        blue_mask: u32,
    },
}

impl Palette {
    pub fn direct(red_mask: u32, green_mask: u32, blue_mask: u32) -> Self {
        Self::Direct {
            red_mask,
            green_mask,
            blue_mask,
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct { .. })
    }

    /// 将原始像素值解析为 RGB。
    ///
    /// 索引越界时返回黑色；直接颜色按掩码提取并扩展到 8 位。
    pub fn rgb_of(&self, pixel: u32) -> Rgb {
        match self {
            Self::Indexed(colors) => colors.get(pixel as usize).copied().unwrap_or(Rgb::BLACK),
            Self::Direct {
                red_mask,
                green_mask,
                blue_mask,
            } => Rgb::new(
                extract_channel(pixel, *red_mask),
                extract_channel(pixel, *green_mask),
                extract_channel(pixel, *blue_mask),
            ),
        }
    }

    /// 将 RGB 按直接颜色掩码打包；索引调色板返回 `None`。
    pub fn pack_rgb(&self, rgb: Rgb) -> Option<u32> {
        match self {
            Self::Indexed(_) => None,
            Self::Direct {
                red_mask,
                green_mask,
                blue_mask,
            } => Some(
                insert_channel(rgb.red, *red_mask)
                    | insert_channel(rgb.green, *green_mask)
                    | insert_channel(rgb.blue, *blue_mask),
            ),
        }
    }
}

/// 按掩码提取通道，并以位复制方式扩展到 8 位。
pub(crate) fn extract_channel(pixel: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    let shift = mask.trailing_zeros();
    let bits = (mask >> shift).count_ones();
    expand_to_eight((pixel & mask) >> shift, bits)
}

/// 将 8 位通道值写入掩码所在位置。
pub(crate) fn insert_channel(value: u8, mask: u32) -> u32 {
    if mask == 0 {
        return 0;
    }
    let shift = mask.trailing_zeros();
    let bits = (mask >> shift).count_ones();
    let scaled = if bits >= 8 {
        (value as u32) << (bits - 8)
    } else {
        (value as u32) >> (8 - bits)
    };
    (scaled << shift) & mask
}

fn expand_to_eight(value: u32, bits: u32) -> u8 {
    if bits == 0 {
        return 0;
    }
    if bits >= 8 {
        return (value >> (bits - 8)) as u8;
    }
    let mut out = 0u32;
    let mut filled = 0;
    while filled < 8 {
        out = (out << bits) | value;
        filled += bits;
    }
    (out >> (filled - 8)) as u8
}

/// 计算扫描行字节数（按 `pad` 对齐）。
pub fn bytes_per_line(width: u32, depth: u8, pad: u32) -> usize {
    let pad = pad.max(1) as usize;
    let raw = (width as usize * depth as usize + 7) / 8;
    raw.div_ceil(pad) * pad
}

/// 解码后的原始栅格。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    depth: u8,
    scanline_pad: u32,
    bytes_per_line: usize,
    byte_order: ByteOrder,
    palette: Palette,
    data: Vec<u8>,
    transparent_pixel: Option<u32>,
    alpha: Option<u8>,
    alpha_data: Option<Vec<u8>>,
    mask_data: Option<Vec<u8>>,
    mask_pad: u32,
}

impl Raster {
    /// 创建全零数据的栅格。
    ///
    /// # 示例
    /// ```rust
    /// use dpi_image::raster::{Palette, Raster, Rgb};
    ///
    /// let raster = Raster::new(2, 2, 4, Palette::Indexed(vec![Rgb::BLACK, Rgb::WHITE]))?;
    /// assert_eq!(raster.bytes_per_line(), 4);
    /// # Ok::<(), dpi_image::ImageError>(())
    /// ```
    pub fn new(width: u32, height: u32, depth: u8, palette: Palette) -> Result<Self, ImageError> {
        Self::validate_shape(width, height, depth)?;
        let bpl = bytes_per_line(width, depth, DEFAULT_SCANLINE_PAD);
        Self::with_data(
            width,
            height,
            depth,
            palette,
            DEFAULT_SCANLINE_PAD,
            vec![0; bpl * height as usize],
        )
    }

    /// 使用已有像素数据创建栅格。
    ///
    /// 数据长度必须至少为 `bytes_per_line * height`。
    pub fn with_data(
        width: u32,
        height: u32,
        depth: u8,
        palette: Palette,
        scanline_pad: u32,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        Self::validate_shape(width, height, depth)?;
        if scanline_pad == 0 {
            return Err(ImageError::InvalidArgument("扫描行对齐不能为 0".to_string()));
        }
        let bpl = bytes_per_line(width, depth, scanline_pad);
        let expected = bpl
            .checked_mul(height as usize)
            .ok_or_else(|| ImageError::InvalidArgument("栅格尺寸溢出".to_string()))?;
        if data.len() < expected {
            return Err(ImageError::InvalidArgument(format!(
                "像素数据长度不足：{} 字节（需要：{} 字节）",
                data.len(),
                expected
            )));
        }

        Ok(Self {
            width,
            height,
            depth,
            scanline_pad,
            bytes_per_line: bpl,
            byte_order: if depth == 16 {
                ByteOrder::LsbFirst
            } else {
                ByteOrder::MsbFirst
            },
            palette,
            data,
            transparent_pixel: None,
            alpha: None,
            alpha_data: None,
            mask_data: None,
            mask_pad: DEFAULT_SCANLINE_PAD,
        })
    }

    fn validate_shape(width: u32, height: u32, depth: u8) -> Result<(), ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidArgument(format!(
                "栅格尺寸必须为正数：{}x{}",
                width, height
            )));
        }
        if !matches!(depth, 1 | 2 | 4 | 8 | 16 | 24 | 32) {
            return Err(ImageError::UnsupportedDepth(format!("位深 {}", depth)));
        }
        Ok(())
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// 指定透明像素（原始像素值，索引或直接颜色值）。
    pub fn with_transparent_pixel(mut self, pixel: u32) -> Self {
        self.transparent_pixel = Some(pixel);
        self
    }

    /// 指定全局 alpha。
    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// 指定逐像素 alpha（行优先，长度 `width * height`）。
    pub fn with_alpha_data(mut self, alpha_data: Vec<u8>) -> Result<Self, ImageError> {
        if alpha_data.len() != self.pixel_count() {
            return Err(ImageError::InvalidArgument(format!(
                "alpha 数据长度不匹配：{}（需要：{}）",
                alpha_data.len(),
                self.pixel_count()
            )));
        }
        self.alpha_data = Some(alpha_data);
        Ok(self)
    }

    /// 指定 1 位透明遮罩数据（按 `mask_pad` 对齐的扫描行）。
    pub fn with_mask_data(mut self, mask_data: Vec<u8>, mask_pad: u32) -> Result<Self, ImageError> {
        if mask_pad == 0 {
            return Err(ImageError::InvalidArgument("遮罩对齐不能为 0".to_string()));
        }
        let expected = bytes_per_line(self.width, 1, mask_pad) * self.height as usize;
        if mask_data.len() < expected {
            return Err(ImageError::InvalidArgument(format!(
                "遮罩数据长度不足：{} 字节（需要：{} 字节）",
                mask_data.len(),
                expected
            )));
        }
        self.mask_data = Some(mask_data);
        self.mask_pad = mask_pad;
        Ok(self)
    }

    /// 去掉所有透明信息（透明像素、alpha、遮罩），像素与调色板不变。
    pub fn without_transparency(mut self) -> Self {
        self.transparent_pixel = None;
        self.alpha = None;
        self.alpha_data = None;
        self.mask_data = None;
        self.mask_pad = DEFAULT_SCANLINE_PAD;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn scanline_pad(&self) -> u32 {
        self.scanline_pad
    }

    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn transparent_pixel(&self) -> Option<u32> {
        self.transparent_pixel
    }

    pub fn alpha(&self) -> Option<u8> {
        self.alpha
    }

    pub fn alpha_data(&self) -> Option<&[u8]> {
        self.alpha_data.as_deref()
    }

    pub fn mask_data(&self) -> Option<&[u8]> {
        self.mask_data.as_deref()
    }

    pub fn mask_pad(&self) -> u32 {
        self.mask_pad
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// 是否携带任何透明信息（决定原生表面使用 ARGB32 还是 RGB24）。
    pub fn has_transparency(&self) -> bool {
        self.transparent_pixel.is_some()
            || self.alpha.is_some()
            || self.mask_data.is_some()
            || self.alpha_data.is_some()
    }

    /// 透明像素对应的 RGB（即颜色键）。
    ///
    /// 索引调色板下，越界的透明索引视为无颜色键。
    pub fn transparent_rgb(&self) -> Option<Rgb> {
        let pixel = self.transparent_pixel?;
        match &self.palette {
            Palette::Indexed(colors) => colors.get(pixel as usize).copied(),
            Palette::Direct { .. } => Some(self.palette.rgb_of(pixel)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_per_line_respects_pad() {
        assert_eq!(bytes_per_line(2, 4, 4), 4);
        assert_eq!(bytes_per_line(3, 24, 4), 12);
        assert_eq!(bytes_per_line(3, 24, 1), 9);
        assert_eq!(bytes_per_line(9, 1, 1), 2);
    }

    #[test]
    fn expand_to_eight_replicates_bits() {
        assert_eq!(expand_to_eight(1, 1), 0xFF);
        assert_eq!(expand_to_eight(0x1F, 5), 0xFF);
        assert_eq!(expand_to_eight(0x10, 5), 0x84);
        assert_eq!(expand_to_eight(0x3FF, 10), 0xFF);
    }

    #[test]
    fn direct_palette_round_trips_565() {
        let palette = Palette::direct(0xF800, 0x07E0, 0x001F);
        let packed = palette.pack_rgb(Rgb::WHITE).expect("direct palette packs");
        assert_eq!(packed, 0xFFFF);
        assert_eq!(palette.rgb_of(packed), Rgb::WHITE);
        assert_eq!(palette.rgb_of(0xF800), Rgb::new(255, 0, 0));
    }

    #[test]
    fn with_data_rejects_short_buffer() {
        let result = Raster::with_data(4, 4, 24, Palette::direct(0xFF0000, 0xFF00, 0xFF), 4, vec![0; 10]);
        assert!(matches!(result, Err(ImageError::InvalidArgument(_))));
    }

    #[test]
    fn new_rejects_zero_size_and_odd_depth() {
        assert!(matches!(
            Raster::new(0, 4, 8, Palette::Indexed(vec![])),
            Err(ImageError::InvalidArgument(_))
        ));
        assert!(matches!(
            Raster::new(4, 4, 3, Palette::Indexed(vec![])),
            Err(ImageError::UnsupportedDepth(_))
        ));
    }

    #[test]
    fn transparent_rgb_resolves_through_palette() {
        let raster = Raster::new(1, 1, 1, Palette::Indexed(vec![Rgb::BLACK, Rgb::WHITE]))
            .expect("raster")
            .with_transparent_pixel(1);
        assert_eq!(raster.transparent_rgb(), Some(Rgb::WHITE));

        let out_of_range = raster.clone().with_transparent_pixel(7);
        assert_eq!(out_of_range.transparent_rgb(), None);
    }
}
