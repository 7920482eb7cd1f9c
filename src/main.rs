//! # dpi-image：命令行入口
//!
//! 用法：`dpi-image <图片路径> [缩放级别] [输出目录]`
//!
//! 按 `name@1.5x.ext` / `name@2x.ext` 约定查找高分辨率资源，刷新到指定缩放级别后，
//! 输出拷贝 / 禁用态 / 灰度三种变体的 PNG。设备配置从环境变量 `DPI_IMAGE_CONFIG`
//! 指向的 JSON 文件读取。

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use dpi_image::config::DeviceConfig;
use dpi_image::device::HostDevice;
use dpi_image::image_resource::Image;
use dpi_image::resolution::ScaledFileNames;
use dpi_image::variant::Variant;

const DEFAULT_ZOOM: u32 = 200;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let Some(input) = args.first().map(PathBuf::from) else {
        return Err("用法：dpi-image <图片路径> [缩放级别] [输出目录]".to_string());
    };
    let zoom = match args.get(1) {
        Some(value) => value
            .trim_end_matches('%')
            .parse::<u32>()
            .map_err(|e| format!("缩放级别无效：{}（{}）", value, e))?,
        None => DEFAULT_ZOOM,
    };
    let out_dir = args.get(2).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    let config = match std::env::var_os("DPI_IMAGE_CONFIG") {
        Some(path) => DeviceConfig::load_from_path(Path::new(&path)),
        None => DeviceConfig::default(),
    };
    let device = HostDevice::new(config)?;

    let mut resource = Image::from_file_supplier(device.clone(), Rc::new(ScaledFileNames::new(&input)))?;
    device.set_zoom(zoom)?;
    resource.refresh_for_zoom()?;

    std::fs::create_dir_all(&out_dir).map_err(|e| format!("创建输出目录失败：{}", e))?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    for variant in [Variant::Copy, Variant::Disabled, Variant::Grayscale] {
        let derived = Image::variant_of(device.clone(), &resource, variant)?;
        let raster = derived.raster_at(zoom)?;
        let target = out_dir.join(format!("{}@{}-{}.png", stem, zoom, variant.as_str()));

        let rgba = image::RgbaImage::from_raw(raster.width(), raster.height(), raster.to_rgba8())
            .ok_or_else(|| "导出像素长度异常".to_string())?;
        rgba.save(&target)
            .map_err(|e| format!("写入 {} 失败：{}", target.display(), e))?;

        log::info!(
            "✅ 已输出 {}（{}x{}）",
            target.display(),
            raster.width(),
            raster.height()
        );
    }

    let stats = device.surface_stats();
    log::info!(
        "📊 表面统计 - 创建：{} 销毁：{} 存活：{}",
        stats.created,
        stats.destroyed,
        stats.live()
    );
    Ok(())
}
