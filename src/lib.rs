//! # dpi-image：缩放感知的图片资源库
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  调用方（控件 / 命令行）                                  │
//! │       │  Image::from_* / refresh_for_zoom / raster_at     │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Result<T, ImageError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕                                                  │
//! │  image_resource ── Image（表面 + 来源 + 缓存缩放级别）    │
//! │   ├─ resolution    Static / 文件名供应方 / 栅格供应方     │
//! │   ├─ scale         缩放级别换算与栅格缩放                 │
//! │   ├─ convert       栅格 → 规范 32 位缓冲                  │
//! │   ├─ composite     预乘 alpha / 遮罩 / 颜色键             │
//! │   ├─ variant       拷贝 / 禁用态 / 灰度                   │
//! │   └─ pipeline      逐像素变换                             │
//! │                                                          │
//! │  device ── 表面分配器 + 缩放级别 + 主题色 + 解码器        │
//! │   ├─ surface       原生表面接口与内存实现                 │
//! │   ├─ decoder       image 解码 + infer 签名校验 + LRU 缓存 │
//! │   └─ config        设备配置（JSON）                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `ImageError` |
//! | [`config`] | 设备配置、缩放档位、JSON 读写 |
//! | [`device`] | 宿主设备接口与 `HostDevice` |
//! | [`raster`] | 解码栅格数据模型：调色板、字节序、透明信息 |
//! | [`convert`] | 任意位深栅格 → 规范像素缓冲 |
//! | [`composite`] | 透明来源选择与预乘 alpha |
//! | [`pipeline`] | 规范缓冲的逐像素访问 |
//! | [`variant`] | 拷贝 / 禁用态 / 灰度变体 |
//! | [`scale`] | 缩放级别换算、最近邻与平滑缩放 |
//! | [`surface`] | 原生表面与分配器 |
//! | [`resolution`] | 分辨率来源与供应方 |
//! | [`decoder`] | 图片文件解码与缓存 |
//! | [`image_resource`] | 图片实体：构造、刷新、导出、绘图上下文、释放 |

pub mod composite;
pub mod config;
pub mod convert;
pub mod decoder;
pub mod device;
pub mod error;
pub mod image_resource;
pub mod pipeline;
pub mod raster;
pub mod resolution;
pub mod scale;
pub mod surface;
pub mod variant;

pub use error::ImageError;
