//! # 缩放级别刷新
//!
//! ## 设计思路
//!
//! 设备缩放级别变化后，图片按来源重新生成原生表面：
//!
//! - `Static`：导出当前像素，从旧缩放级别插值到新缩放级别；
//!   图标与带颜色键的图片先把 alpha 还原为 1 位遮罩，缩放后仍是二值透明
//! - 供应方精确提供了新级别的资源：直接用该资源生成
//! - 供应方只有 100% 资源：把 100% 资源缩放到新级别再生成；
//!   若当前表面已经来自 100% 资源且缩放后像素尺寸不变，则不重新生成
//!
//! ## 实现思路
//!
//! 刷新是原子的：先完整构建新表面，成功后才失效绘图上下文、替换旧表面、更新尺寸与缓存级别。
//! 任何一步失败都直接返回错误，图片保持刷新前的状态。

use crate::ImageError;
use crate::composite::TransparencyRecord;
use crate::resolution::ResolutionSource;
use crate::scale::{REFERENCE_ZOOM, scale_raster, scale_size};

use super::Image;
use super::build::{BuiltSurface, build_surface, rescaled_record};

/// 新表面及其附带信息。
struct Regenerated {
    built: BuiltSurface,
    record: TransparencyRecord,
    from_reference_asset: bool,
}

impl Image {
    /// 按设备当前缩放级别刷新原生表面。
    ///
    /// 返回是否重新生成了表面；缩放级别未变化时什么都不做并返回 `false`。
    pub fn refresh_for_zoom(&mut self) -> Result<bool, ImageError> {
        self.check_live()?;

        let zoom = self.device.current_zoom();
        if zoom == self.cached_zoom {
            return Ok(false);
        }

        let regenerated = match &self.source {
            ResolutionSource::Static => Some(self.regenerate_static(zoom)?),
            _ => self.regenerate_from_supplier(zoom)?,
        };

        let previous_zoom = self.cached_zoom;
        self.cached_zoom = zoom;

        match regenerated {
            Some(regenerated) => {
                self.install(regenerated.built);
                self.record = regenerated.record;
                self.from_reference_asset = regenerated.from_reference_asset;
                log::info!(
                    "🔄 图片已按缩放级别刷新：{}% -> {}%（{}x{}）",
                    previous_zoom,
                    zoom,
                    self.width,
                    self.height
                );
                Ok(true)
            }
            None => {
                log::debug!(
                    "⏭️ 缩放级别 {}% -> {}%：100% 资源缩放后尺寸不变，沿用当前表面",
                    previous_zoom,
                    zoom
                );
                Ok(false)
            }
        }
    }

    fn regenerate_static(&self, zoom: u32) -> Result<Regenerated, ImageError> {
        let exported = self.export_for_rescale()?;
        let scaled = scale_raster(
            &exported,
            self.cached_zoom,
            zoom,
            self.device.scale_method(),
            self.device.resize_filter(),
        )?;
        let built = build_surface(self.device.as_ref(), &scaled)?;

        Ok(Regenerated {
            built,
            record: rescaled_record(&self.record, &scaled),
            from_reference_asset: false,
        })
    }

    fn regenerate_from_supplier(&self, zoom: u32) -> Result<Option<Regenerated>, ImageError> {
        let asset = self
            .source
            .resolve(zoom, self.device.decoder())?
            .ok_or_else(|| ImageError::InvalidArgument("图片没有可用的供应方".to_string()))?;
        let base_record = TransparencyRecord::from_raster(&asset.raster);

        if asset.exact {
            let built = build_surface(self.device.as_ref(), &asset.raster)?;
            return Ok(Some(Regenerated {
                built,
                record: base_record,
                from_reference_asset: zoom == REFERENCE_ZOOM,
            }));
        }

        let target = scale_size(asset.raster.width(), asset.raster.height(), REFERENCE_ZOOM, zoom);
        if self.from_reference_asset && target == (self.width, self.height) {
            return Ok(None);
        }

        let scaled = scale_raster(
            &asset.raster,
            REFERENCE_ZOOM,
            zoom,
            self.device.scale_method(),
            self.device.resize_filter(),
        )?;
        let built = build_surface(self.device.as_ref(), &scaled)?;
        Ok(Some(Regenerated {
            built,
            record: rescaled_record(&base_record, &scaled),
            from_reference_asset: true,
        }))
    }
}
