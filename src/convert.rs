//! # 像素格式转换模块
//!
//! ## 设计思路
//!
//! 把任意编码的栅格（1/2/4/8 位索引，或 8/16/24/32 位直接颜色）转换为原生表面使用的
//! 规范缓冲：每像素 4 字节、宿主字节序、通道位于 (alpha, red, green, blue) 槽位。
//!
//! 槽位偏移与目标掩码只取决于宿主字节序，进程内只计算一次（`CHANNEL_LAYOUT`）。
//!
//! ## 实现思路
//!
//! 1. 校验位深与调色板组合（不支持即 `UnsupportedDepth`）
//! 2. 源格式与目标完全一致时直接拷贝（快路径，保留源缓冲的行跨度）
//! 3. 否则逐像素位掩码 blit：提取通道 → 重新打包到目标掩码
//!
//! alpha 槽位在此阶段保持为 0，由 `composite` 负责写入。

use once_cell::sync::Lazy;

use crate::ImageError;
use crate::raster::{ByteOrder, Palette, Raster};

/// 规范缓冲的位深。
pub const CANONICAL_DEPTH: u8 = 32;

/// 宿主字节序决定的通道布局。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    pub alpha: usize,
    pub red: usize,
    pub green: usize,
    pub blue: usize,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
    pub order: ByteOrder,
}

impl ChannelLayout {
    pub const LITTLE_ENDIAN: ChannelLayout = ChannelLayout {
        alpha: 3,
        red: 2,
        green: 1,
        blue: 0,
        red_mask: 0xFF0000,
        green_mask: 0xFF00,
        blue_mask: 0xFF,
        order: ByteOrder::LsbFirst,
    };

    pub const BIG_ENDIAN: ChannelLayout = ChannelLayout {
        alpha: 0,
        red: 1,
        green: 2,
        blue: 3,
        red_mask: 0xFF0000,
        green_mask: 0xFF00,
        blue_mask: 0xFF,
        order: ByteOrder::MsbFirst,
    };

    fn detect() -> Self {
        if cfg!(target_endian = "big") {
            Self::BIG_ENDIAN
        } else {
            Self::LITTLE_ENDIAN
        }
    }

    /// 目标掩码对应的直接调色板。
    pub fn palette(&self) -> Palette {
        Palette::direct(self.red_mask, self.green_mask, self.blue_mask)
    }
}

/// 进程级通道布局，按宿主字节序选择一次。
pub static CHANNEL_LAYOUT: Lazy<ChannelLayout> = Lazy::new(ChannelLayout::detect);

/// 当前宿主的通道布局。
pub fn channel_layout() -> ChannelLayout {
    *CHANNEL_LAYOUT
}

/// 校验位深与调色板组合。
pub fn validate_depth(raster: &Raster) -> Result<(), ImageError> {
    let depth = raster.depth();
    let supported = match raster.palette() {
        Palette::Indexed(_) => matches!(depth, 1 | 2 | 4 | 8),
        Palette::Direct { .. } => matches!(depth, 8 | 16 | 24 | 32),
    };
    if supported {
        Ok(())
    } else {
        Err(ImageError::UnsupportedDepth(format!(
            "{} 位{}调色板无法转换",
            depth,
            if raster.palette().is_direct() { "直接颜色" } else { "索引" }
        )))
    }
}

/// 源栅格是否已与目标规范格式完全一致。
pub fn is_canonical(raster: &Raster, stride: usize, layout: &ChannelLayout) -> bool {
    match raster.palette() {
        Palette::Direct {
            red_mask,
            green_mask,
            blue_mask,
        } => {
            raster.depth() == CANONICAL_DEPTH
                && raster.bytes_per_line() == stride
                && *red_mask == layout.red_mask
                && *green_mask == layout.green_mask
                && *blue_mask == layout.blue_mask
                && raster.byte_order() == layout.order
        }
        Palette::Indexed(_) => false,
    }
}

/// 将栅格转换为 `stride * height` 字节的规范缓冲。
pub fn to_canonical(raster: &Raster, stride: usize, layout: &ChannelLayout) -> Result<Vec<u8>, ImageError> {
    validate_depth(raster)?;

    let width = raster.width() as usize;
    let height = raster.height() as usize;
    if stride < width * 4 {
        return Err(ImageError::InvalidArgument(format!(
            "目标行跨度过小：{}（宽度：{}）",
            stride, width
        )));
    }
    let len = stride * height;

    if is_canonical(raster, stride, layout) {
        log::debug!("⚡ 像素格式已是规范格式，直接拷贝 {}x{}", width, height);
        return Ok(raster.data()[..len].to_vec());
    }

    let mut buffer = vec![0u8; len];
    let palette = raster.palette();
    let dest = layout.palette();

    for y in 0..raster.height() {
        let row = y as usize * stride;
        for x in 0..raster.width() {
            let rgb = palette.rgb_of(raster.raw_pixel(x, y));
            let packed = dest.pack_rgb(rgb).unwrap_or_default();
            let offset = row + x as usize * 4;
            write_packed(&mut buffer[offset..offset + 4], packed, layout.order);
        }
    }

    Ok(buffer)
}

fn write_packed(slot: &mut [u8], value: u32, order: ByteOrder) {
    let bytes = match order {
        ByteOrder::MsbFirst => value.to_be_bytes(),
        ByteOrder::LsbFirst => value.to_le_bytes(),
    };
    slot.copy_from_slice(&bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Rgb;

    fn rgb_at(buffer: &[u8], index: usize, layout: &ChannelLayout) -> (u8, u8, u8) {
        let px = &buffer[index * 4..index * 4 + 4];
        (px[layout.red], px[layout.green], px[layout.blue])
    }

    #[test]
    fn both_layouts_put_channels_at_offsets() {
        for layout in [ChannelLayout::LITTLE_ENDIAN, ChannelLayout::BIG_ENDIAN] {
            let raster = Raster::with_data(
                1,
                1,
                24,
                Palette::direct(0xFF0000, 0xFF00, 0xFF),
                1,
                vec![0x11, 0x22, 0x33],
            )
            .expect("raster");

            let buffer = to_canonical(&raster, 4, &layout).expect("convert");

            assert_eq!(rgb_at(&buffer, 0, &layout), (0x11, 0x22, 0x33));
            assert_eq!(buffer[layout.alpha], 0);
        }
    }

    #[test]
    fn big_endian_accepts_alpha_first_buffers() {
        let layout = ChannelLayout::BIG_ENDIAN;
        let data = vec![0xFF, 0x11, 0x22, 0x33, 0x80, 0x44, 0x55, 0x66];
        let raster = Raster::with_data(2, 1, 32, layout.palette(), 4, data.clone())
            .expect("raster")
            .with_byte_order(layout.order);

        assert!(is_canonical(&raster, 8, &layout));
        let buffer = to_canonical(&raster, 8, &layout).expect("convert");
        assert_eq!(buffer, data);
        assert_eq!(rgb_at(&buffer, 1, &layout), (0x44, 0x55, 0x66));
    }

    #[test]
    fn indexed_pixels_resolve_through_palette() {
        let layout = ChannelLayout::LITTLE_ENDIAN;
        let palette = Palette::Indexed(vec![Rgb::new(1, 2, 3), Rgb::new(200, 100, 50)]);
        let mut raster = Raster::new(3, 1, 1, palette).expect("raster");
        raster.set_pixel(1, 0, 1);

        let buffer = to_canonical(&raster, 12, &layout).expect("convert");

        assert_eq!(rgb_at(&buffer, 0, &layout), (1, 2, 3));
        assert_eq!(rgb_at(&buffer, 1, &layout), (200, 100, 50));
        assert_eq!(rgb_at(&buffer, 2, &layout), (1, 2, 3));
    }

    #[test]
    fn sixteen_bit_direct_expands_channels() {
        let layout = ChannelLayout::LITTLE_ENDIAN;
        let mut raster = Raster::new(1, 1, 16, Palette::direct(0x7C00, 0x03E0, 0x001F)).expect("raster");
        raster.set_pixel(0, 0, 0x7C00);

        let buffer = to_canonical(&raster, 4, &layout).expect("convert");

        assert_eq!(rgb_at(&buffer, 0, &layout), (255, 0, 0));
    }

    #[test]
    fn canonical_source_is_copied_verbatim() {
        let layout = ChannelLayout::LITTLE_ENDIAN;
        let data: Vec<u8> = (0..32).collect();
        let raster = Raster::with_data(4, 2, 32, layout.palette(), 4, data.clone())
            .expect("raster")
            .with_byte_order(layout.order);

        assert!(is_canonical(&raster, 16, &layout));
        assert_eq!(to_canonical(&raster, 16, &layout).expect("convert"), data);
    }

    #[test]
    fn unsupported_depth_palette_combination_is_rejected() {
        let indexed16 = Raster::new(1, 1, 16, Palette::Indexed(vec![Rgb::BLACK])).expect("raster");
        let direct4 = Raster::new(1, 1, 4, Palette::direct(0x8, 0x4, 0x2)).expect("raster");

        assert!(matches!(validate_depth(&indexed16), Err(ImageError::UnsupportedDepth(_))));
        assert!(matches!(validate_depth(&direct4), Err(ImageError::UnsupportedDepth(_))));
        assert!(matches!(
            to_canonical(&indexed16, 4, &ChannelLayout::LITTLE_ENDIAN),
            Err(ImageError::UnsupportedDepth(_))
        ));
    }

    #[test]
    fn host_layout_matches_target_endian() {
        let layout = channel_layout();
        if cfg!(target_endian = "little") {
            assert_eq!(layout, ChannelLayout::LITTLE_ENDIAN);
        } else {
            assert_eq!(layout, ChannelLayout::BIG_ENDIAN);
        }
    }
}
