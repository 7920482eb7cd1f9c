//! 解码错误类型。
//!
//! 解码器失败原样透传给调用方（`ImageError::Decode`），不重试。

/// 外部栅格解码错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("读取图片失败：{0}")]
    IoFailure(String),

    #[error("图片编码无效：{0}")]
    InvalidEncoding(String),

    #[error("图片位深不支持：{0}")]
    UnsupportedDepth(String),

    #[error("无法识别图片格式：{0}")]
    UnrecognizedFormat(String),
}

impl From<image::ImageError> for DecodeError {
    fn from(error: image::ImageError) -> Self {
        use image::error::UnsupportedErrorKind;

        match error {
            image::ImageError::IoError(e) => Self::IoFailure(e.to_string()),
            image::ImageError::Unsupported(e) => match e.kind() {
                UnsupportedErrorKind::Color(color) => Self::UnsupportedDepth(format!("{:?}", color)),
                _ => Self::UnrecognizedFormat(e.to_string()),
            },
            other => Self::InvalidEncoding(other.to_string()),
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(error: std::io::Error) -> Self {
        Self::IoFailure(error.to_string())
    }
}
