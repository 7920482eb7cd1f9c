// 透明合成的性质测试
use dpi_image::convert::channel_layout;
use dpi_image::device::HostDevice;
use dpi_image::image_resource::Image;
use dpi_image::pipeline::read_pixel;
use dpi_image::raster::{Palette, Raster, Rgb};
use proptest::prelude::*;

fn pixels(image: &Image, width: u32, height: u32) -> Vec<(u8, u8, u8, u8)> {
    let bytes = image.surface_bytes().expect("surface bytes");
    let stride = image.surface_stride().expect("stride");
    let layout = channel_layout();
    let mut out = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let px = read_pixel(bytes, stride, &layout, x, y);
            out.push((px.alpha, px.red, px.green, px.blue));
        }
    }
    out
}

fn colored(width: u32, height: u32, rgb: Rgb) -> Raster {
    Raster::new(width, height, 8, Palette::Indexed(vec![rgb])).expect("raster")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn mask_alpha_is_binary(
        width in 1u32..9,
        height in 1u32..9,
        bits in prop::collection::vec(any::<bool>(), 64),
        red in any::<u8>(),
    ) {
        let device = HostDevice::with_zoom(100).expect("device");
        let mut mask = Raster::new(width, height, 1, Palette::Indexed(vec![Rgb::BLACK, Rgb::WHITE]))
            .expect("mask");
        for y in 0..height {
            for x in 0..width {
                mask.set_pixel(x, y, bits[(y * 8 + x) as usize] as u32);
            }
        }

        let icon = Image::from_raster_and_mask(device.clone(), &colored(width, height, Rgb::new(red, 7, 9)), &mask)
            .expect("icon");

        for (i, (a, r, g, b)) in pixels(&icon, width, height).into_iter().enumerate() {
            let opaque = bits[(i as u32 / width * 8 + i as u32 % width) as usize];
            if opaque {
                prop_assert_eq!((a, r, g, b), (255, red, 7, 9));
            } else {
                prop_assert_eq!((a, r, g, b), (0, 0, 0, 0));
            }
        }
    }

    #[test]
    fn per_pixel_alpha_bounds_color_channels(
        alphas in prop::collection::vec(any::<u8>(), 12),
        red in any::<u8>(),
        green in any::<u8>(),
        blue in any::<u8>(),
    ) {
        let device = HostDevice::with_zoom(100).expect("device");
        let raster = colored(4, 3, Rgb::new(red, green, blue))
            .with_alpha_data(alphas.clone())
            .expect("alpha data");

        let image = Image::from_raster(device.clone(), &raster).expect("image");

        for ((a, r, g, b), expected_alpha) in pixels(&image, 4, 3).into_iter().zip(alphas) {
            prop_assert_eq!(a, expected_alpha);
            prop_assert!(r <= a && g <= a && b <= a);
        }
    }
}
