//! # 分辨率来源模块
//!
//! ## 设计思路
//!
//! 图片的像素可能来自三种来源：
//!
//! - `Static`：构造时给定的一份栅格，缩放级别变化时只能由已有像素插值
//! - `FileName`：按缩放级别提供文件路径（例如 `icon@2x.png`）
//! - `RasterData`：按缩放级别直接提供栅格
//!
//! 后两者统称“供应方”。刷新时优先取与当前缩放级别完全匹配的资源，
//! 取不到再退回 100% 资源并由调用方缩放。
//!
//! ## 实现思路
//!
//! - 供应方为 trait，闭包自动实现，便于调用方内联提供。
//! - `resolve` 返回资源及“是否精确匹配”；100% 也取不到时报 `InvalidArgument`。
//! - `ScaledFileNames`：按 `name@1.5x.ext` / `name@2x.ext` 约定查找磁盘上的文件。

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::ImageError;
use crate::decoder::RasterDecoder;
use crate::raster::Raster;
use crate::scale::REFERENCE_ZOOM;

/// 按缩放级别提供图片文件路径。
pub trait FileNameSupplier {
    fn image_path(&self, zoom: u32) -> Option<PathBuf>;
}

impl<F> FileNameSupplier for F
where
    F: Fn(u32) -> Option<PathBuf>,
{
    fn image_path(&self, zoom: u32) -> Option<PathBuf> {
        self(zoom)
    }
}

/// 按缩放级别提供栅格数据。
pub trait RasterDataSupplier {
    fn raster(&self, zoom: u32) -> Option<Raster>;
}

impl<F> RasterDataSupplier for F
where
    F: Fn(u32) -> Option<Raster>,
{
    fn raster(&self, zoom: u32) -> Option<Raster> {
        self(zoom)
    }
}

/// 供应方解析出的资源。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub raster: Raster,
    /// 资源本身对应的缩放级别（精确匹配时等于请求级别，否则为 100）。
    pub zoom: u32,
    pub exact: bool,
}

/// 图片像素的来源。
#[derive(Clone)]
pub enum ResolutionSource {
    Static,
    FileName(Rc<dyn FileNameSupplier>),
    RasterData(Rc<dyn RasterDataSupplier>),
}

impl fmt::Debug for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("Static"),
            Self::FileName(_) => f.write_str("FileName(..)"),
            Self::RasterData(_) => f.write_str("RasterData(..)"),
        }
    }
}

impl ResolutionSource {
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static)
    }

    /// 是否为同一个供应方（按指针判断）。
    pub fn same_supplier(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::FileName(a), Self::FileName(b)) => Rc::ptr_eq(a, b),
            (Self::RasterData(a), Self::RasterData(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// 解析 `zoom` 对应的资源；`Static` 没有供应方，返回 `None`。
    pub fn resolve(&self, zoom: u32, decoder: &dyn RasterDecoder) -> Result<Option<ResolvedAsset>, ImageError> {
        match self {
            Self::Static => Ok(None),
            Self::FileName(supplier) => {
                let (path, asset_zoom) = resolve_with_fallback(zoom, |z| supplier.image_path(z))?;
                log::debug!("📁 缩放 {}% 使用图片文件：{}", zoom, path.display());
                let raster = decoder.decode_path(&path)?;
                Ok(Some(ResolvedAsset {
                    raster,
                    zoom: asset_zoom,
                    exact: asset_zoom == zoom,
                }))
            }
            Self::RasterData(supplier) => {
                let (raster, asset_zoom) = resolve_with_fallback(zoom, |z| supplier.raster(z))?;
                Ok(Some(ResolvedAsset {
                    raster,
                    zoom: asset_zoom,
                    exact: asset_zoom == zoom,
                }))
            }
        }
    }
}

fn resolve_with_fallback<T>(zoom: u32, lookup: impl Fn(u32) -> Option<T>) -> Result<(T, u32), ImageError> {
    if let Some(asset) = lookup(zoom) {
        return Ok((asset, zoom));
    }
    if zoom != REFERENCE_ZOOM {
        if let Some(asset) = lookup(REFERENCE_ZOOM) {
            return Ok((asset, REFERENCE_ZOOM));
        }
    }
    Err(ImageError::InvalidArgument(format!(
        "供应方在 {}% 与 100% 均未提供图片",
        zoom
    )))
}

/// 按 `name@<倍率>x.ext` 约定查找高分辨率文件的供应方。
///
/// `icon.png` 在 150% 下对应 `icon@1.5x.png`，200% 下对应 `icon@2x.png`；
/// 只返回磁盘上存在的文件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledFileNames {
    base: PathBuf,
}

impl ScaledFileNames {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `zoom` 对应的候选路径（不检查是否存在）。
    pub fn candidate(&self, zoom: u32) -> PathBuf {
        if zoom == REFERENCE_ZOOM {
            return self.base.clone();
        }

        let stem = self
            .base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let density = zoom as f32 / REFERENCE_ZOOM as f32;
        let name = match self.base.extension() {
            Some(ext) => format!("{}@{}x.{}", stem, density, ext.to_string_lossy()),
            None => format!("{}@{}x", stem, density),
        };
        self.base.with_file_name(name)
    }
}

impl FileNameSupplier for ScaledFileNames {
    fn image_path(&self, zoom: u32) -> Option<PathBuf> {
        let path = self.candidate(zoom);
        path.is_file().then_some(path)
    }
}
