//! # 逐像素变换流水线
//!
//! 合成、禁用/灰度变体、导出都要按 (alpha, red, green, blue) 访问规范缓冲。
//! 偏移与行跨度只在这里出现，调用方只提供 `Argb -> Argb` 的变换。

use crate::convert::ChannelLayout;

/// 规范缓冲中的一个像素。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Argb {
    pub alpha: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Argb {
    pub const fn new(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self {
            alpha,
            red,
            green,
            blue,
        }
    }
}

/// 读取缓冲中 `(x, y)` 处的像素。
pub fn read_pixel(buffer: &[u8], stride: usize, layout: &ChannelLayout, x: u32, y: u32) -> Argb {
    let offset = y as usize * stride + x as usize * 4;
    let px = &buffer[offset..offset + 4];
    Argb::new(px[layout.alpha], px[layout.red], px[layout.green], px[layout.blue])
}

/// 对缓冲中每个像素应用变换 `f(x, y, 原像素) -> 新像素`。
pub fn for_each_pixel<F>(buffer: &mut [u8], width: u32, height: u32, stride: usize, layout: &ChannelLayout, mut f: F)
where
    F: FnMut(u32, u32, Argb) -> Argb,
{
    for y in 0..height {
        let row = y as usize * stride;
        for x in 0..width {
            let offset = row + x as usize * 4;
            let px = &mut buffer[offset..offset + 4];
            let out = f(
                x,
                y,
                Argb::new(px[layout.alpha], px[layout.red], px[layout.green], px[layout.blue]),
            );
            px[layout.alpha] = out.alpha;
            px[layout.red] = out.red;
            px[layout.green] = out.green;
            px[layout.blue] = out.blue;
        }
    }
}

/// 规范缓冲的可变视图：缓冲、尺寸、行跨度与通道布局放在一起传递。
pub struct PixelView<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    stride: usize,
    layout: ChannelLayout,
}

impl<'a> PixelView<'a> {
    pub fn new(data: &'a mut [u8], width: u32, height: u32, stride: usize, layout: ChannelLayout) -> Self {
        Self {
            data,
            width,
            height,
            stride,
            layout,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 读取 `(x, y)` 处的像素，越界返回 `None`。
    pub fn pixel(&self, x: u32, y: u32) -> Option<Argb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(read_pixel(self.data, self.stride, &self.layout, x, y))
    }

    /// 写入一个像素，越界时忽略。
    pub fn set_pixel(&mut self, x: u32, y: u32, px: Argb) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = y as usize * self.stride + x as usize * 4;
        let slot = &mut self.data[offset..offset + 4];
        slot[self.layout.alpha] = px.alpha;
        slot[self.layout.red] = px.red;
        slot[self.layout.green] = px.green;
        slot[self.layout.blue] = px.blue;
    }

    pub fn for_each<F>(&mut self, f: F)
    where
        F: FnMut(u32, u32, Argb) -> Argb,
    {
        for_each_pixel(self.data, self.width, self.height, self.stride, &self.layout, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visits_every_pixel_and_skips_row_padding() {
        let layout = ChannelLayout::LITTLE_ENDIAN;
        let stride = 12;
        let mut buffer = vec![0xEEu8; stride * 2];
        let mut visited = Vec::new();

        for_each_pixel(&mut buffer, 2, 2, stride, &layout, |x, y, _| {
            visited.push((x, y));
            Argb::new(1, 2, 3, 4)
        });

        assert_eq!(visited, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert_eq!(&buffer[0..4], &[4, 3, 2, 1]);
        assert_eq!(&buffer[8..12], &[0xEE; 4]);
        assert_eq!(read_pixel(&buffer, stride, &layout, 1, 1), Argb::new(1, 2, 3, 4));
    }

    #[test]
    fn big_endian_layout_puts_alpha_first() {
        let layout = ChannelLayout::BIG_ENDIAN;
        let mut buffer = vec![0u8; 4];

        for_each_pixel(&mut buffer, 1, 1, 4, &layout, |_, _, _| Argb::new(9, 8, 7, 6));

        assert_eq!(buffer, vec![9, 8, 7, 6]);
    }

    #[test]
    fn view_ignores_out_of_range_pixels() {
        let mut buffer = vec![0u8; 8];
        let mut view = PixelView::new(&mut buffer, 2, 1, 8, ChannelLayout::LITTLE_ENDIAN);

        view.set_pixel(1, 0, Argb::new(4, 3, 2, 1));
        view.set_pixel(2, 0, Argb::new(9, 9, 9, 9));

        assert_eq!(view.pixel(1, 0), Some(Argb::new(4, 3, 2, 1)));
        assert_eq!(view.pixel(0, 1), None);
        assert_eq!(buffer, vec![0, 0, 0, 0, 1, 2, 3, 4]);
    }
}
