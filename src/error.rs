//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `ImageError` 枚举，覆盖图片资源整个生命周期中的失败来源：
//! 参数非法、位深不支持、原生表面分配失败、释放后继续使用、外部解码失败。
//!
//! 所有错误都是“立即致命”的：不重试、不静默恢复，并且必须在任何
//! 破坏性修改提交之前返回（例如刷新时分配失败，旧表面保持不变）。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `DecodeError` 提供 `From` 转换，解码器错误原样透传，无需手动 map。

use crate::decoder::DecodeError;

/// 图片资源统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// 参数非法：尺寸为零、源图与遮罩尺寸不一致、变体选择器无效等
    #[error("参数非法：{0}")]
    InvalidArgument(String),

    /// 位深与调色板组合无法转换
    #[error("不支持的位深：{0}")]
    UnsupportedDepth(String),

    /// 原生表面分配失败
    #[error("资源耗尽：{0}")]
    ResourceExhausted(String),

    /// 图片已释放后仍被访问
    #[error("图片已释放")]
    UseAfterDispose,

    /// 外部解码器错误（原样透传）
    #[error("{0}")]
    Decode(#[from] DecodeError),
}

impl From<ImageError> for String {
    /// 兼容仍使用字符串错误的调用点（例如命令行输出）。
    fn from(error: ImageError) -> Self {
        error.to_string()
    }
}
