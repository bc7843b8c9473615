//! 解析器使用的常量定义
//!
//! 定义了记录边界标记、元数据行前缀、时间格式、字段规则目录和语句关键字。

use crate::parser_config::FieldKind;

/// 记录边界标记（新记录的起始行）
pub const RECORD_START_MARKER: &str = "# Time: ";

/// 注释行前缀
pub const COMMENT_PREFIX: char = '#';

/// 元数据行前缀（井号加空格），不以此开头的行作为查询文本累积
pub const METADATA_PREFIX: &str = "# ";

/// 时间戳格式（chrono 格式串），对应 `YYYY-MM-DDTHH:MM:SS.ffffffZ`
pub const DATETIME_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

// 记录字段名

pub const QUERY_FIELD: &str = "query";
pub const TIME_FIELD: &str = "time";
pub const QUERY_TIME_FIELD: &str = "query_time";
pub const TIME_START_FIELD: &str = "time_start";
pub const QUERY_LENGTH_FIELD: &str = "query_length";
pub const QUERY_TYPE_FIELD: &str = "query_type";
pub const QUERY_DIGEST_FIELD: &str = "query_digest";
pub const FINGERPRINT_ID_FIELD: &str = "fingerprintID";
pub const TABLE_FIELD: &str = "table";

/// 可识别的语句关键字，顺序即并列时的优先级
pub const QUERY_KEYWORDS: [&str; 6] = ["SELECT", "INSERT", "UPDATE", "DELETE", "DROP", "REPLACE"];

/// 元数据字段规则目录：规则名及其类型
pub const FIELD_CATALOG: [(&str, FieldKind); 26] = [
    ("Time", FieldKind::Datetime),
    ("Schema", FieldKind::String),
    ("Query_time", FieldKind::Time),
    ("Lock_time", FieldKind::Time),
    ("Rows_sent", FieldKind::Int),
    ("Rows_examined", FieldKind::Int),
    ("Rows_affected", FieldKind::Int),
    ("Rows_read", FieldKind::Int),
    ("Bytes_sent", FieldKind::Int),
    ("Tmp_tables", FieldKind::Int),
    ("Tmp_disk_tables", FieldKind::Int),
    ("Tmp_table_sizes", FieldKind::Int),
    ("QC_Hit", FieldKind::Bool),
    ("Full_scan", FieldKind::Bool),
    ("Full_join", FieldKind::Bool),
    ("Tmp_table", FieldKind::Bool),
    ("Tmp_table_on_disk", FieldKind::Bool),
    ("Filesort", FieldKind::Bool),
    ("Filesort_on_disk", FieldKind::Bool),
    ("Merge_passes", FieldKind::Int),
    ("InnoDB_IO_r_ops", FieldKind::Int),
    ("InnoDB_IO_r_bytes", FieldKind::Int),
    ("InnoDB_IO_r_wait", FieldKind::Time),
    ("InnoDB_rec_lock_wait", FieldKind::Time),
    ("InnoDB_queue_wait", FieldKind::Time),
    ("InnoDB_pages_distinct", FieldKind::Int),
];
