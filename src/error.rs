//! 错误类型定义
//!
//! 定义了解析过程中可能出现的所有错误类型。这里的错误都是致命错误，
//! 出现后整个解析流程终止；单条记录被丢弃的原因见 [`crate::finalizer::DropReason`]。

use thiserror::Error;

/// 解析错误类型
///
/// 包含了慢查询日志解析过程中可能遇到的所有致命错误。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// 读取输入流失败
    #[error("can't read input data: {0}")]
    IoError(String),

    /// 文件未找到或无法访问
    #[error("can't open file: {path}")]
    FileNotFound {
        /// 文件路径及底层错误
        path: String,
    },

    /// 元数据字段的值无法转换为规则要求的类型
    #[error("unable to parse {field}: {raw}")]
    InvalidField {
        /// 规则名（原始大小写）
        field: String,
        /// 捕获到的原始文本
        raw: String,
        /// 转换失败的具体原因
        #[source]
        source: ConvertError,
    },

    /// 字段规则定义无法编译
    #[error("invalid field rule {name}: {reason}")]
    InvalidRule {
        /// 规则名
        name: String,
        /// 编译错误
        reason: String,
    },

    /// 记录序列化或写出失败
    #[error("unable to encode record to JSON: {0}")]
    SerializeError(String),
}

/// 单个捕获值的类型转换错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// 时间戳不符合 `YYYY-MM-DDTHH:MM:SS.ffffffZ`
    #[error("invalid datetime: {0}")]
    Datetime(String),

    /// 时长不是合法的秒数
    #[error("invalid duration: expected seconds with optional fraction")]
    Duration,

    /// 整数解析失败
    #[error("invalid integer: {0}")]
    Int(String),

    /// 布尔值只接受 Yes / No
    #[error("invalid syntax: expected Yes or No")]
    Bool,
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::SerializeError(err.to_string())
    }
}
