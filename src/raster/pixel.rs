//! 按位深读写原始像素值。

use super::{ByteOrder, Raster, Rgb};

impl Raster {
    /// 读取 `(x, y)` 处的原始像素值，越界返回 `None`。
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.raw_pixel(x, y))
    }

    /// 写入 `(x, y)` 处的原始像素值，越界时忽略。
    pub fn set_pixel(&mut self, x: u32, y: u32, value: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.write_raw_pixel(x, y, value);
    }

    /// 读取 `(x, y)` 处像素解析后的 RGB。
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<Rgb> {
        self.pixel(x, y).map(|pixel| self.palette.rgb_of(pixel))
    }

    pub(crate) fn raw_pixel(&self, x: u32, y: u32) -> u32 {
        let row = y as usize * self.bytes_per_line;
        let x = x as usize;
        let data = &self.data;
        match self.depth {
            1 | 2 | 4 => {
                let depth = self.depth as usize;
                let bit = x * depth;
                let byte = data[row + bit / 8] as u32;
                let shift = 8 - depth - (bit % 8);
                (byte >> shift) & ((1 << depth) - 1)
            }
            8 => data[row + x] as u32,
            16 => {
                let i = row + x * 2;
                read_bytes(&data[i..i + 2], self.byte_order)
            }
            24 => {
                let i = row + x * 3;
                read_bytes(&data[i..i + 3], self.byte_order)
            }
            _ => {
                let i = row + x * 4;
                read_bytes(&data[i..i + 4], self.byte_order)
            }
        }
    }

    pub(crate) fn write_raw_pixel(&mut self, x: u32, y: u32, value: u32) {
        let row = y as usize * self.bytes_per_line;
        let x = x as usize;
        let order = self.byte_order;
        match self.depth {
            1 | 2 | 4 => {
                let depth = self.depth as usize;
                let bit = x * depth;
                let shift = 8 - depth - (bit % 8);
                let mask = (((1u32 << depth) - 1) << shift) as u8;
                let byte = &mut self.data[row + bit / 8];
                *byte = (*byte & !mask) | (((value << shift) as u8) & mask);
            }
            8 => self.data[row + x] = value as u8,
            16 => {
                let i = row + x * 2;
                write_bytes(&mut self.data[i..i + 2], value, order);
            }
            24 => {
                let i = row + x * 3;
                write_bytes(&mut self.data[i..i + 3], value, order);
            }
            _ => {
                let i = row + x * 4;
                write_bytes(&mut self.data[i..i + 4], value, order);
            }
        }
    }
}

fn read_bytes(bytes: &[u8], order: ByteOrder) -> u32 {
    match order {
        ByteOrder::MsbFirst => bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32),
        ByteOrder::LsbFirst => bytes.iter().rev().fold(0u32, |acc, b| (acc << 8) | *b as u32),
    }
}

fn write_bytes(bytes: &mut [u8], value: u32, order: ByteOrder) {
    let len = bytes.len();
    for (i, slot) in bytes.iter_mut().enumerate() {
        let shift = match order {
            ByteOrder::MsbFirst => (len - 1 - i) * 8,
            ByteOrder::LsbFirst => i * 8,
        };
        *slot = (value >> shift) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::super::Palette;
    use super::*;

    #[test]
    fn sub_byte_pixels_are_msb_first() {
        let raster = Raster::with_data(
            4,
            1,
            2,
            Palette::Indexed(vec![Rgb::BLACK; 4]),
            1,
            vec![0b11_10_01_00],
        )
        .expect("raster");

        assert_eq!(raster.pixel(0, 0), Some(3));
        assert_eq!(raster.pixel(1, 0), Some(2));
        assert_eq!(raster.pixel(2, 0), Some(1));
        assert_eq!(raster.pixel(3, 0), Some(0));
        assert_eq!(raster.pixel(4, 0), None);
    }

    #[test]
    fn set_pixel_round_trips_every_depth() {
        for depth in [1u8, 2, 4, 8, 16, 24, 32] {
            let palette = if depth <= 8 {
                Palette::Indexed(vec![Rgb::BLACK; 1 << depth.min(8)])
            } else {
                Palette::direct(0xFF0000, 0xFF00, 0xFF)
            };
            let mut raster = Raster::new(5, 3, depth, palette).expect("raster");
            let max = if depth == 32 { u32::MAX } else { (1u32 << depth) - 1 };

            raster.set_pixel(3, 2, max);
            raster.set_pixel(4, 2, 1);

            assert_eq!(raster.pixel(3, 2), Some(max), "depth {depth}");
            assert_eq!(raster.pixel(4, 2), Some(1), "depth {depth}");
            assert_eq!(raster.pixel(2, 2), Some(0), "depth {depth}");
        }
    }

    #[test]
    fn sixteen_bit_defaults_to_lsb_first() {
        let raster = Raster::with_data(
            1,
            1,
            16,
            Palette::direct(0xF800, 0x07E0, 0x001F),
            2,
            vec![0x1F, 0x00],
        )
        .expect("raster");

        assert_eq!(raster.byte_order(), ByteOrder::LsbFirst);
        assert_eq!(raster.rgb_at(0, 0), Some(Rgb::new(0, 0, 255)));
    }
}
