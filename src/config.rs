//! # 配置模块
//!
//! ## 设计思路
//!
//! 将宿主设备的“可调策略”集中到 `DeviceConfig`：初始缩放级别、禁用态主题色、
//! 单个原生表面的像素上限、解码缓存容量，以及缩放质量。
//! 缩放档位（quality / balanced / speed）作为高层语义，映射到缩放方式与滤镜组合。
//!
//! ## 实现思路
//!
//! - `Default` 提供可直接使用的平衡配置。
//! - `ScalingProfile` 负责档位字符串解析与反向输出。
//! - `apply_scaling_profile` 将档位转换为具体参数，`infer_scaling_profile` 反推档位。
//! - 配置以 JSON 持久化；读取失败时回退默认值，不阻断启动。

use std::fs;
use std::path::Path;

use fast_image_resize as fr;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::ImageError;
use crate::raster::Rgb;

/// 缩放方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMethod {
    /// 最近邻，保持索引与颜色键不变。
    Nearest,
    /// 卷积滤镜平滑缩放。
    Smooth,
}

/// 平滑缩放使用的滤镜。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeFilter {
    /// 映射到 `image` 的滤镜（回退路径使用）。
    pub fn to_image_filter(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }

    /// 映射到 `fast_image_resize` 的卷积滤镜。
    pub fn to_fast_filter(self) -> fr::FilterType {
        match self {
            Self::Nearest => fr::FilterType::Box,
            Self::Triangle => fr::FilterType::Bilinear,
            Self::CatmullRom => fr::FilterType::CatmullRom,
            Self::Gaussian => fr::FilterType::Mitchell,
            Self::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }
}

/// 宿主设备配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// 启动时的设备缩放级别（百分比，100 = 1x）。
    pub initial_zoom: u32,
    /// 禁用态暗色像素替换色（控件阴影色）。
    pub shadow_color: Rgb,
    /// 禁用态亮色像素替换色（控件背景色）。
    pub background_color: Rgb,
    /// 单个原生表面允许的最大像素数。
    pub max_surface_pixels: u64,
    /// 解码缓存条目数。
    pub decode_cache_entries: usize,
    pub scale_method: ScaleMethod,
    pub resize_filter: ResizeFilter,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            initial_zoom: 100,
            shadow_color: Rgb::new(0x80, 0x80, 0x80),
            background_color: Rgb::new(0xEF, 0xEF, 0xEF),
            max_surface_pixels: 64 * 1024 * 1024,
            decode_cache_entries: 32,
            scale_method: ScaleMethod::Smooth,
            resize_filter: ResizeFilter::Triangle,
        }
    }
}

/// 缩放质量档位。
///
/// - `Quality`：Lanczos3 平滑缩放
/// - `Balanced`：双线性平滑缩放
/// - `Speed`：最近邻
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingProfile {
    Quality,
    Balanced,
    Speed,
}

impl ScalingProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use dpi_image::config::ScalingProfile;
    ///
    /// let p = ScalingProfile::from_str("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), dpi_image::ImageError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(profile: &str) -> Result<Self, ImageError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(ImageError::InvalidArgument(format!(
                "未知缩放档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串，供日志与持久化使用。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl DeviceConfig {
    /// 基于当前参数反推缩放档位。
    pub fn infer_scaling_profile(&self) -> ScalingProfile {
        match (self.scale_method, self.resize_filter) {
            (ScaleMethod::Nearest, _) => ScalingProfile::Speed,
            (ScaleMethod::Smooth, ResizeFilter::Lanczos3 | ResizeFilter::CatmullRom) => ScalingProfile::Quality,
            (ScaleMethod::Smooth, _) => ScalingProfile::Balanced,
        }
    }

    /// 应用指定缩放档位到实际参数。
    pub fn apply_scaling_profile(&mut self, profile: ScalingProfile) {
        match profile {
            ScalingProfile::Quality => {
                self.scale_method = ScaleMethod::Smooth;
                self.resize_filter = ResizeFilter::Lanczos3;
            }
            ScalingProfile::Balanced => {
                self.scale_method = ScaleMethod::Smooth;
                self.resize_filter = ResizeFilter::Triangle;
            }
            ScalingProfile::Speed => {
                self.scale_method = ScaleMethod::Nearest;
                self.resize_filter = ResizeFilter::Nearest;
            }
        }
    }

    /// 校验配置是否可用。
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.initial_zoom == 0 {
            return Err(ImageError::InvalidArgument("缩放级别必须为正数".to_string()));
        }
        if self.max_surface_pixels == 0 {
            return Err(ImageError::InvalidArgument("表面像素上限必须为正数".to_string()));
        }
        if self.decode_cache_entries == 0 {
            return Err(ImageError::InvalidArgument("解码缓存容量必须为正数".to_string()));
        }
        Ok(())
    }

    /// 从 JSON 文件读取配置；文件缺失、无法解析或校验失败时回退默认配置。
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let loaded = fs::read_to_string(path)
            .map_err(|e| format!("读取失败：{}", e))
            .and_then(|content| serde_json::from_str::<Self>(&content).map_err(|e| format!("解析失败：{}", e)))
            .and_then(|config| config.validate().map(|_| config).map_err(String::from));

        match loaded {
            Ok(config) => {
                log::info!("✅ 已加载设备配置：{}", path.display());
                config
            }
            Err(err) => {
                log::warn!("⚠️ 设备配置不可用，使用默认值（{}）：{}", path.display(), err);
                Self::default()
            }
        }
    }

    /// 以格式化 JSON 写入配置。
    pub fn save_to_path(&self, path: &Path) -> Result<(), ImageError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ImageError::InvalidArgument(format!("序列化配置失败：{}", e)))?;
        fs::write(path, content)
            .map_err(|e| ImageError::InvalidArgument(format!("写入配置文件失败：{}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn unique_temp_dir() -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("dpi-image-config-test-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let dir = unique_temp_dir();
        let path = dir.join("device.json");
        let mut config = DeviceConfig {
            initial_zoom: 200,
            shadow_color: Rgb::new(1, 2, 3),
            ..DeviceConfig::default()
        };
        config.apply_scaling_profile(ScalingProfile::Quality);

        config.save_to_path(&path).expect("save config");
        let loaded = DeviceConfig::load_from_path(&path);

        assert_eq!(loaded, config);
        assert_eq!(loaded.infer_scaling_profile(), ScalingProfile::Quality);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn load_bad_config_falls_back_to_default() {
        let dir = unique_temp_dir();
        let path = dir.join("device.json");
        std::fs::write(&path, "not-json").expect("write invalid config");

        assert_eq!(DeviceConfig::load_from_path(&path), DeviceConfig::default());

        std::fs::write(&path, r#"{"initial_zoom":0}"#).expect("write zero zoom");
        assert_eq!(DeviceConfig::load_from_path(&path), DeviceConfig::default());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let dir = unique_temp_dir();
        let path = dir.join("device.json");
        std::fs::write(&path, r#"{"initial_zoom":150,"scale_method":"nearest"}"#).expect("write config");

        let loaded = DeviceConfig::load_from_path(&path);

        assert_eq!(loaded.initial_zoom, 150);
        assert_eq!(loaded.scale_method, ScaleMethod::Nearest);
        assert_eq!(loaded.max_surface_pixels, DeviceConfig::default().max_surface_pixels);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn profile_strings_round_trip() {
        for profile in [ScalingProfile::Quality, ScalingProfile::Balanced, ScalingProfile::Speed] {
            let parsed = ScalingProfile::from_str(profile.as_str()).expect("parse profile");
            assert_eq!(parsed, profile);

            let mut config = DeviceConfig::default();
            config.apply_scaling_profile(profile);
            assert_eq!(config.infer_scaling_profile(), profile);
        }
        assert!(ScalingProfile::from_str("ultra").is_err());
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let config = DeviceConfig {
            max_surface_pixels: 0,
            ..DeviceConfig::default()
        };
        assert!(matches!(config.validate(), Err(ImageError::InvalidArgument(_))));
        assert!(DeviceConfig::default().validate().is_ok());
    }
}
