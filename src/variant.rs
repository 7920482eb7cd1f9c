//! # 视觉变体模块
//!
//! ## 设计思路
//!
//! 从已有图片派生三种外观：原样拷贝、禁用态、灰度。变换只作用于像素缓冲，
//! 尺寸与透明属性由调用方（`Image::variant_of`）复制。
//!
//! ## 实现思路
//!
//! - 带 alpha 的表面先反预乘得到直通颜色，变换后再预乘写回；alpha 槽位不变。
//! - 禁用态按亮度平方和二分：`r²+g²+b² < 98304` 取阴影色，否则取背景色。
//! - 灰度：`(2r + 5g + b) >> 3`。

use std::str::FromStr;

use crate::ImageError;
use crate::composite::{premultiply, unpremultiply};
use crate::pipeline::{Argb, PixelView};
use crate::raster::Rgb;

/// 禁用态亮度阈值（平方和）。
pub const DISABLED_INTENSITY_THRESHOLD: u32 = 98304;

/// 变体类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Copy,
    Disabled,
    Grayscale,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Disabled => "disabled",
            Self::Grayscale => "gray",
        }
    }

    /// 变体是否保留源图的颜色键。
    pub fn keeps_color_key(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl FromStr for Variant {
    type Err = ImageError;

    /// 解析变体选择器。
    ///
    /// # 示例
    /// ```rust
    /// use dpi_image::variant::Variant;
    ///
    /// let v: Variant = "gray".parse()?;
    /// assert_eq!(v, Variant::Grayscale);
    /// # Ok::<(), dpi_image::ImageError>(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "disable" | "disabled" => Ok(Self::Disabled),
            "gray" | "grey" | "grayscale" => Ok(Self::Grayscale),
            other => Err(ImageError::InvalidArgument(format!(
                "未知变体：{}（可选：copy / disabled / gray）",
                other
            ))),
        }
    }
}

/// 禁用态使用的两种主题色。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisabledPalette {
    pub shadow: Rgb,
    pub background: Rgb,
}

/// 对规范缓冲原地应用变体。
pub fn apply_variant(view: &mut PixelView<'_>, has_alpha: bool, variant: Variant, palette: &DisabledPalette) {
    match variant {
        Variant::Copy => {}
        Variant::Disabled => view.for_each(|_, _, px| {
            let (r, g, b) = straight(px, has_alpha);
            let intensity = r * r + g * g + b * b;
            let rgb = if intensity < DISABLED_INTENSITY_THRESHOLD {
                palette.shadow
            } else {
                palette.background
            };
            repack(px.alpha, rgb.red, rgb.green, rgb.blue, has_alpha)
        }),
        Variant::Grayscale => view.for_each(|_, _, px| {
            let (r, g, b) = straight(px, has_alpha);
            let intensity = ((r + r + g + g + g + g + g + b) >> 3) as u8;
            repack(px.alpha, intensity, intensity, intensity, has_alpha)
        }),
    }
}

fn straight(px: Argb, has_alpha: bool) -> (u32, u32, u32) {
    if has_alpha && px.alpha != 0 {
        (
            unpremultiply(px.red, px.alpha) as u32,
            unpremultiply(px.green, px.alpha) as u32,
            unpremultiply(px.blue, px.alpha) as u32,
        )
    } else {
        (px.red as u32, px.green as u32, px.blue as u32)
    }
}

fn repack(alpha: u8, red: u8, green: u8, blue: u8, has_alpha: bool) -> Argb {
    if has_alpha {
        Argb::new(
            alpha,
            premultiply(red, alpha),
            premultiply(green, alpha),
            premultiply(blue, alpha),
        )
    } else {
        Argb::new(alpha, red, green, blue)
    }
}
