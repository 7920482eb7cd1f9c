//! # 解码模块
//!
//! ## 设计思路
//!
//! 图片文件格式的解析不属于本 crate，统一委托给 `image`。本模块只负责：
//!
//! - 尽早失败：先用 `infer` 校验文件签名，确认是图片再完整解码
//! - 把解码结果整理为 `Raster`（24 位直接颜色，带 alpha 时附逐像素 alpha）
//! - 把 `image` 的错误映射到 `DecodeError`
//!
//! ## 实现思路
//!
//! - `RasterDecoder`：解码器接口，设备持有一个实例。
//! - `ImageCrateDecoder`：基于 `image` 的实现。
//! - `CachingDecoder`：按路径缓存解码结果，避免缩放级别来回切换时重复读盘。

mod cache;
mod error;

use std::path::Path;

use image::GenericImageView;

use crate::raster::Raster;

pub use cache::CachingDecoder;
pub use error::DecodeError;

/// 栅格解码器。
pub trait RasterDecoder {
    /// 解码内存中的图片字节。
    fn decode_bytes(&self, bytes: &[u8]) -> Result<Raster, DecodeError>;

    /// 读取并解码文件。
    fn decode_path(&self, path: &Path) -> Result<Raster, DecodeError> {
        let bytes = std::fs::read(path)
            .map_err(|e| DecodeError::IoFailure(format!("{}：{}", path.display(), e)))?;
        self.decode_bytes(&bytes)
    }
}

/// 基于 `image` 的解码器。
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    pub fn new() -> Self {
        Self
    }

    /// 通过文件头签名判断是否为图片。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::UnrecognizedFormat("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| DecodeError::UnrecognizedFormat("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(DecodeError::UnrecognizedFormat(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }
}

impl RasterDecoder for ImageCrateDecoder {
    fn decode_bytes(&self, bytes: &[u8]) -> Result<Raster, DecodeError> {
        Self::validate_image_signature(bytes)?;

        let decoded = image::load_from_memory(bytes)?;
        let (width, height) = decoded.dimensions();
        let has_alpha = decoded.color().has_alpha();
        let rgba = decoded.to_rgba8();

        let raster = Raster::from_rgba8(width, height, rgba.as_raw(), has_alpha)
            .map_err(|e| DecodeError::InvalidEncoding(e.to_string()))?;

        log::debug!(
            "🖼️ 图片解码完成：{}x{}（alpha：{}）",
            width,
            height,
            has_alpha
        );
        Ok(raster)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    /// 生成一张 PNG 的字节。
    pub(crate) fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn decodes_png_with_alpha() {
        let bytes = png_bytes(3, 2, [10, 20, 30, 128]);

        let raster = ImageCrateDecoder::new().decode_bytes(&bytes).expect("decode");

        assert_eq!((raster.width(), raster.height()), (3, 2));
        assert_eq!(raster.depth(), 24);
        assert_eq!(raster.alpha_data().map(|a| a.len()), Some(6));
        assert_eq!(raster.rgb_at(2, 1), Some(crate::raster::Rgb::new(10, 20, 30)));
    }

    #[test]
    fn decodes_opaque_png_without_alpha() {
        let image = image::RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]));
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("encode png");

        let raster = ImageCrateDecoder::new()
            .decode_bytes(&out.into_inner())
            .expect("decode");

        assert!(raster.alpha_data().is_none());
        assert!(!raster.has_transparency());
    }

    #[test]
    fn rejects_non_image_bytes() {
        let decoder = ImageCrateDecoder::new();

        assert!(matches!(
            decoder.decode_bytes(b"hello world"),
            Err(DecodeError::UnrecognizedFormat(_))
        ));
        assert!(matches!(decoder.decode_bytes(&[]), Err(DecodeError::UnrecognizedFormat(_))));
    }

    #[test]
    fn truncated_png_is_invalid_encoding() {
        let mut bytes = png_bytes(4, 4, [0, 0, 0, 255]);
        bytes.truncate(40);

        let result = ImageCrateDecoder::new().decode_bytes(&bytes);

        assert!(matches!(
            result,
            Err(DecodeError::InvalidEncoding(_)) | Err(DecodeError::IoFailure(_))
        ));
    }

    #[test]
    fn missing_file_is_io_failure() {
        let result = ImageCrateDecoder::new().decode_path(Path::new("/definitely/not/here.png"));

        assert!(matches!(result, Err(DecodeError::IoFailure(_))));
    }
}
