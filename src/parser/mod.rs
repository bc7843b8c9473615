//! Parser 模块 - 解析 MySQL 慢查询日志
//!
//! 此模块提供了完整的日志解析功能,包括:
//! - 字段规则的编译和匹配
//! - 按行组装记录
//! - 流式读取和便捷 API 函数

mod api;
pub mod assembler;
pub mod constants;
pub mod field_rules;
pub mod record_parser;

pub use api::{
    for_each_record, for_each_record_from_file, parse_records_from_file, parse_records_from_string,
};
pub use assembler::{AssemblerStats, RecordAssembler};
pub use field_rules::{FieldRule, FieldRuleEngine, convert, parse_seconds};
pub use record_parser::{SlowlogParser, read_logical_line};
