//! # Slowlog Poke
//!
//! 把 MySQL 慢查询日志流转换为逐条、类型化的结构化记录，便于后续分析。
//!
//! ## 功能特性
//!
//! - **流式组装**: 按 `# Time: ` 边界切分记录，一条记录完成后立即输出
//! - **类型化字段**: 26 个已知元数据字段按规则提取并转换为时间、时长、整数、布尔或字符串
//! - **派生字段**: 起始时间、查询类型、查询指纹及其 ID、引用的表名
//! - **明确的错误语义**: 字段格式错误默认终止整个流程，单条记录的问题只丢弃该记录
//!
//! ## 快速开始
//!
//! ```rust
//! use slowlog_poke::parse_records_from_string;
//!
//! let log = "\
//! ## Time: 2024-01-01T00:00:10.000000Z
//! ## User@Host: app[app] @ localhost []
//! ## Query_time: 2.000000  Lock_time: 0.000000 Rows_sent: 1  Rows_examined: 10
//! SET timestamp=1704067210;
//! SELECT 1 FROM x;
//! ";
//!
//! let records = parse_records_from_string(log)?;
//! let record = &records[0];
//!
//! assert_eq!(record.str("query_type"), Some("SELECT"));
//! assert_eq!(record.str("table"), Some("x"));
//! assert_eq!(record.int("rows_examined"), Some(10));
//! assert_eq!(
//!     record.to_json_line()?.contains(r#""time_start":"2024-01-01T00:00:08.000000Z""#),
//!     true
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### 从文件流式读取
//!
//! ```rust,no_run
//! use slowlog_poke::{FieldRuleEngine, ParserConfig, for_each_record_from_file};
//!
//! let engine = FieldRuleEngine::new(&ParserConfig::default())?;
//! let stats = for_each_record_from_file("slow.log", &engine, |record| {
//!     println!("{}", record.to_json_line()?);
//!     Ok(())
//! })?;
//! eprintln!("emitted {} records", stats.emitted);
//! # Ok::<(), slowlog_poke::ParseError>(())
//! ```
//!
//! ## 日志格式
//!
//! ```text
//! # Time: 2024-01-01T00:00:10.000000Z
//! # User@Host: app[app] @ localhost []  Id:     7
//! # Query_time: 2.000000  Lock_time: 0.000000 Rows_sent: 1  Rows_examined: 10
//! SET timestamp=1704067210;
//! SELECT 1 FROM x;
//! ```

pub mod error;
pub mod finalizer;
pub mod fingerprint;
pub mod parser;
pub mod parser_config;
pub mod record;
pub mod tables;
pub mod tools;

pub use error::{ConvertError, ParseError};
pub use finalizer::{DropReason, Finalized, RecordFinalizer};
pub use parser::{
    AssemblerStats, FieldRuleEngine, RecordAssembler, SlowlogParser, for_each_record,
    for_each_record_from_file, parse_records_from_file, parse_records_from_string,
};
pub use parser_config::{FieldKind, MalformedFieldPolicy, ParserConfig, QueryJoin};
pub use record::{FieldValue, Record};
