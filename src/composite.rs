//! # 透明度合成模块
//!
//! ## 设计思路
//!
//! 原生表面存储的是预乘 alpha 像素。栅格的透明信息有四种来源，按固定优先级只取一种：
//!
//! 1. 1 位遮罩或透明像素（颜色键）：alpha 只可能是 0 或 255，alpha 为 0 时颜色清零
//! 2. 全局 alpha：所有像素同一 alpha
//! 3. 逐像素 alpha
//! 4. 都没有：不透明，缓冲保持不变
//!
//! ## 实现思路
//!
//! - `premultiply` / `unpremultiply` 是全 crate 唯一的预乘公式实现。
//! - `TransparencySource::from_raster` 负责优先级判定，`apply` 负责改写缓冲。
//! - `TransparencyRecord` 是图片需要长期保存的透明属性（颜色键 / 全局 alpha / 逐像素 alpha 拷贝）。

use crate::convert::ChannelLayout;
use crate::pipeline::{Argb, for_each_pixel};
use crate::raster::{Raster, TransparencyKind, TransparencyMask};

/// 预乘：`t = c*a + 128; (t + (t >> 8)) >> 8`。
pub fn premultiply(c: u8, a: u8) -> u8 {
    let t = c as u32 * a as u32 + 128;
    ((t + (t >> 8)) >> 8) as u8
}

/// 反预乘：`a == 0` 时原样返回，否则 `min(255, (c*255 + a/2) / a)`。
pub fn unpremultiply(c: u8, a: u8) -> u8 {
    if a == 0 {
        return c;
    }
    let a = a as u32;
    ((c as u32 * 255 + a / 2) / a).min(255) as u8
}

/// 对单个像素的颜色通道做预乘。
pub fn premultiply_argb(px: Argb) -> Argb {
    Argb::new(
        px.alpha,
        premultiply(px.red, px.alpha),
        premultiply(px.green, px.alpha),
        premultiply(px.blue, px.alpha),
    )
}

/// 对单个像素的颜色通道做反预乘。
pub fn unpremultiply_argb(px: Argb) -> Argb {
    Argb::new(
        px.alpha,
        unpremultiply(px.red, px.alpha),
        unpremultiply(px.green, px.alpha),
        unpremultiply(px.blue, px.alpha),
    )
}

/// 本次合成采用的透明来源。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransparencySource<'a> {
    Opaque,
    /// 遮罩或颜色键生成的二值遮罩。
    Mask(TransparencyMask),
    GlobalAlpha(u8),
    PerPixel(&'a [u8]),
}

impl<'a> TransparencySource<'a> {
    /// 按“遮罩/颜色键 → 全局 alpha → 逐像素 alpha”的优先级选择透明来源。
    pub fn from_raster(raster: &'a Raster) -> Self {
        if let Some(mask) = raster.transparency_mask() {
            return Self::Mask(mask);
        }
        if let Some(alpha) = raster.alpha() {
            return Self::GlobalAlpha(alpha);
        }
        match raster.alpha_data() {
            Some(data) => Self::PerPixel(data),
            None => Self::Opaque,
        }
    }

    /// 目标像素的 alpha；`None` 表示不透明（缓冲不需要改写）。
    fn alpha_at(&self, x: u32, y: u32, width: u32) -> Option<u8> {
        match self {
            Self::Opaque => None,
            Self::Mask(mask) => Some(if mask.is_opaque(x, y) { 0xFF } else { 0 }),
            Self::GlobalAlpha(alpha) => Some(*alpha),
            Self::PerPixel(data) => Some(data[y as usize * width as usize + x as usize]),
        }
    }
}

/// 将透明来源写入规范缓冲（alpha 槽位 + 预乘颜色）。
pub fn apply(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    stride: usize,
    layout: &ChannelLayout,
    source: &TransparencySource<'_>,
) {
    if matches!(source, TransparencySource::Opaque) {
        return;
    }
    for_each_pixel(buffer, width, height, stride, layout, |x, y, px| {
        let alpha = source.alpha_at(x, y, width).unwrap_or(0xFF);
        premultiply_argb(Argb { alpha, ..px })
    });
}

/// 图片需要保存的透明属性。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransparencyRecord {
    /// 颜色键（`0xRRGGBB`）。
    pub color_key: Option<u32>,
    pub global_alpha: Option<u8>,
    pub alpha_data: Option<Vec<u8>>,
}

impl TransparencyRecord {
    /// 从栅格提取需要记录的透明属性。
    ///
    /// 遮罩/颜色键路径只记录颜色键；否则记录全局 alpha，
    /// 全局 alpha 缺失时再记录逐像素 alpha 的拷贝。
    pub fn from_raster(raster: &Raster) -> Self {
        if matches!(
            raster.transparency_kind(),
            TransparencyKind::Mask | TransparencyKind::ColorKey
        ) {
            return Self {
                color_key: raster.transparent_rgb().map(|rgb| rgb.to_u32()),
                ..Self::default()
            };
        }

        let global_alpha = raster.alpha();
        Self {
            color_key: None,
            global_alpha,
            alpha_data: match global_alpha {
                Some(_) => None,
                None => raster.alpha_data().map(<[u8]>::to_vec),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::read_pixel;
    use crate::raster::{Palette, Rgb};
    use proptest::prelude::*;

    const LAYOUT: ChannelLayout = ChannelLayout::LITTLE_ENDIAN;

    fn white_buffer(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = vec![0u8; width as usize * height as usize * 4];
        for_each_pixel(&mut buffer, width, height, width as usize * 4, &LAYOUT, |_, _, _| {
            Argb::new(0, 255, 255, 255)
        });
        buffer
    }

    #[test]
    fn premultiply_edges() {
        assert_eq!(premultiply(200, 0), 0);
        assert_eq!(premultiply(200, 255), 200);
        assert_eq!(premultiply(255, 128), 128);
        assert_eq!(unpremultiply(77, 0), 77);
        assert_eq!(unpremultiply(128, 128), 255);
        assert_eq!(unpremultiply(200, 100), 255);
    }

    #[test]
    fn mask_zeroes_transparent_color() {
        let mut raster = Raster::new(2, 1, 1, Palette::Indexed(vec![Rgb::BLACK, Rgb::WHITE]))
            .expect("raster")
            .with_transparent_pixel(1);
        raster.set_pixel(1, 0, 1);
        let mut buffer = white_buffer(2, 1);

        apply(&mut buffer, 2, 1, 8, &LAYOUT, &TransparencySource::from_raster(&raster));

        assert_eq!(read_pixel(&buffer, 8, &LAYOUT, 0, 0), Argb::new(255, 255, 255, 255));
        assert_eq!(read_pixel(&buffer, 8, &LAYOUT, 1, 0), Argb::new(0, 0, 0, 0));
    }

    #[test]
    fn global_alpha_wins_over_per_pixel_alpha() {
        let raster = Raster::new(2, 1, 24, Palette::direct(0xFF0000, 0xFF00, 0xFF))
            .expect("raster")
            .with_alpha(128)
            .with_alpha_data(vec![10, 20])
            .expect("alpha data");
        let mut buffer = white_buffer(2, 1);

        let source = TransparencySource::from_raster(&raster);
        assert_eq!(source, TransparencySource::GlobalAlpha(128));
        apply(&mut buffer, 2, 1, 8, &LAYOUT, &source);

        assert_eq!(read_pixel(&buffer, 8, &LAYOUT, 1, 0), Argb::new(128, 128, 128, 128));

        let record = TransparencyRecord::from_raster(&raster);
        assert_eq!(record.global_alpha, Some(128));
        assert_eq!(record.alpha_data, None);
    }

    #[test]
    fn per_pixel_alpha_is_recorded_as_copy() {
        let raster = Raster::new(2, 1, 24, Palette::direct(0xFF0000, 0xFF00, 0xFF))
            .expect("raster")
            .with_alpha_data(vec![0, 255])
            .expect("alpha data");
        let mut buffer = white_buffer(2, 1);

        apply(&mut buffer, 2, 1, 8, &LAYOUT, &TransparencySource::from_raster(&raster));

        assert_eq!(read_pixel(&buffer, 8, &LAYOUT, 0, 0), Argb::new(0, 0, 0, 0));
        assert_eq!(read_pixel(&buffer, 8, &LAYOUT, 1, 0), Argb::new(255, 255, 255, 255));
        assert_eq!(
            TransparencyRecord::from_raster(&raster).alpha_data,
            Some(vec![0, 255])
        );
    }

    #[test]
    fn opaque_raster_leaves_buffer_untouched() {
        let raster = Raster::new(1, 1, 8, Palette::Indexed(vec![Rgb::WHITE])).expect("raster");
        let mut buffer = white_buffer(1, 1);
        let before = buffer.clone();

        apply(&mut buffer, 1, 1, 4, &LAYOUT, &TransparencySource::from_raster(&raster));

        assert_eq!(buffer, before);
        assert_eq!(TransparencyRecord::from_raster(&raster), TransparencyRecord::default());
    }

    proptest! {
        #[test]
        fn premultiplied_channel_never_exceeds_alpha(c in any::<u8>(), a in any::<u8>()) {
            prop_assert!(premultiply(c, a) <= a);
        }

        #[test]
        fn round_trip_within_one_for_high_alpha(c in any::<u8>(), a in 128u8..=255) {
            let back = unpremultiply(premultiply(c, a), a);
            prop_assert!((back as i32 - c as i32).abs() <= 1);
        }

        #[test]
        fn round_trip_error_bounded_by_quantization(c in any::<u8>(), a in 1u8..=255) {
            let back = unpremultiply(premultiply(c, a), a);
            let err = (back as i32 - c as i32).unsigned_abs();
            prop_assert!(2 * a as u32 * err <= 255 + a as u32);
        }
    }
}
