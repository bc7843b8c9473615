//! 便捷 API 函数
//!
//! 提供了一组方便使用的高层 API，用于快速解析慢查询日志。

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::ParseError;
use crate::parser::assembler::{AssemblerStats, RecordAssembler};
use crate::parser::field_rules::FieldRuleEngine;
use crate::parser::record_parser::read_logical_line;
use crate::record::Record;

/// 流式处理：每完成一条有效记录就调用一次回调
///
/// 记录在遇到下一条记录的边界时立即交给回调，不做批量缓冲。
///
/// # 返回
///
/// * `Ok(AssemblerStats)` - 处理完整个输入后的计数
/// * `Err(ParseError)` - 读取失败、字段转换失败或回调返回的错误
///
/// # 示例
///
/// ```
/// use slowlog_poke::{FieldRuleEngine, for_each_record};
///
/// let log = "# Time: 2024-01-01T00:00:10.000000Z\n# Query_time: 2.000000\nSELECT 1 FROM x\n";
/// let engine = FieldRuleEngine::mysql_default()?;
///
/// let mut tables = Vec::new();
/// let stats = for_each_record(log.as_bytes(), &engine, |record| {
///     tables.push(record.str("table").unwrap_or_default().to_string());
///     Ok(())
/// })?;
///
/// assert_eq!(tables, vec!["x"]);
/// assert_eq!(stats.emitted, 1);
/// # Ok::<(), slowlog_poke::ParseError>(())
/// ```
pub fn for_each_record<R, F>(mut reader: R, engine: &FieldRuleEngine, mut f: F) -> Result<AssemblerStats, ParseError>
where
    R: BufRead,
    F: FnMut(Record) -> Result<(), ParseError>,
{
    let mut assembler = RecordAssembler::new(engine);
    let mut buffer = Vec::with_capacity(4096);

    while let Some(line) = read_logical_line(&mut reader, &mut buffer)? {
        assembler.push_line(&line, &mut f)?;
    }
    assembler.finish(&mut f)?;

    Ok(assembler.stats())
}

/// 从文件流式处理
///
/// # 错误
///
/// 文件无法打开时返回 `ParseError::FileNotFound`，其余同 [`for_each_record`]。
pub fn for_each_record_from_file<P, F>(path: P, engine: &FieldRuleEngine, f: F) -> Result<AssemblerStats, ParseError>
where
    P: AsRef<Path>,
    F: FnMut(Record) -> Result<(), ParseError>,
{
    let path_ref = path.as_ref();
    let file = File::open(path_ref).map_err(|e| ParseError::FileNotFound {
        path: format!("{}: {}", path_ref.display(), e),
    })?;
    // 较大的缓冲区减少系统调用
    let reader = BufReader::with_capacity(256 * 1024, file);
    for_each_record(reader, engine, f)
}

/// 使用默认配置解析字符串，返回所有有效记录
///
/// # 示例
///
/// ```
/// use slowlog_poke::parse_records_from_string;
///
/// let log = "# Time: 2024-01-01T00:00:10.000000Z\n# Query_time: 2.000000\nSELECT 1 FROM x\n";
/// let records = parse_records_from_string(log)?;
///
/// assert_eq!(records[0].str("query_type"), Some("SELECT"));
/// # Ok::<(), slowlog_poke::ParseError>(())
/// ```
pub fn parse_records_from_string(input: &str) -> Result<Vec<Record>, ParseError> {
    let engine = FieldRuleEngine::mysql_default()?;
    let mut records = Vec::new();
    for_each_record(input.as_bytes(), &engine, |record| {
        records.push(record);
        Ok(())
    })?;
    Ok(records)
}

/// 使用默认配置解析文件，返回所有有效记录
pub fn parse_records_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Record>, ParseError> {
    let engine = FieldRuleEngine::mysql_default()?;
    let mut records = Vec::new();
    for_each_record_from_file(path, &engine, |record| {
        records.push(record);
        Ok(())
    })?;
    Ok(records)
}
