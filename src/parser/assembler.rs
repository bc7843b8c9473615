//! RecordAssembler - 按行组装记录
//!
//! 逐行读取慢查询日志，根据行首判断记录边界，把元数据字段和查询文本
//! 合并到当前记录中；遇到新的边界或输入结束时把当前记录交给 [`RecordFinalizer`]。

use std::mem;

use tracing::{trace, warn};

use crate::error::ParseError;
use crate::finalizer::{Finalized, RecordFinalizer};
use crate::parser::field_rules::FieldRuleEngine;
use crate::record::Record;
use crate::tools::{is_comment_line, is_metadata_line, is_record_start_line, query_type};

/// 组装过程的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    /// 读入的逻辑行数
    pub lines: u64,
    /// 遇到的边界标记（`# Time: `）数
    pub boundaries: u64,
    /// 交给收尾器的记录数
    pub finalized: u64,
    /// 输出的记录数
    pub emitted: u64,
    /// 丢弃的记录数
    pub dropped: u64,
}

/// 记录组装器
///
/// 同一时刻只持有一条当前记录。记录在边界处被移交给收尾器，之后组装器重新开始一条空记录。
///
/// # 示例
///
/// ```
/// use slowlog_poke::parser::{FieldRuleEngine, RecordAssembler};
///
/// let engine = FieldRuleEngine::mysql_default()?;
/// let mut assembler = RecordAssembler::new(&engine);
/// let mut records = Vec::new();
///
/// for line in [
///     "# Time: 2024-01-01T00:00:10.000000Z",
///     "# Query_time: 2.000000  Lock_time: 0.000000",
///     "SELECT 1 FROM x",
/// ] {
///     assembler.push_line(line, |r| { records.push(r); Ok(()) })?;
/// }
/// assembler.finish(|r| { records.push(r); Ok(()) })?;
///
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].str("table"), Some("x"));
/// # Ok::<(), slowlog_poke::ParseError>(())
/// ```
pub struct RecordAssembler<'e> {
    engine: &'e FieldRuleEngine,
    finalizer: RecordFinalizer,
    current: Record,
    stats: AssemblerStats,
}

impl<'e> RecordAssembler<'e> {
    pub fn new(engine: &'e FieldRuleEngine) -> Self {
        Self {
            engine,
            finalizer: RecordFinalizer::new(),
            current: Record::new(),
            stats: AssemblerStats::default(),
        }
    }

    /// 当前正在组装的记录
    pub fn current(&self) -> &Record {
        &self.current
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// 处理一个逻辑行
    ///
    /// 1. 边界行：当前记录非空时先收尾，再开始新记录（边界行本身随后参与字段提取）；
    /// 2. 非注释行：不含语句关键字则整行忽略；
    /// 3. 合并：不以 `# ` 开头的行计入查询文本，所有行都执行字段规则。
    ///
    /// 收尾后有效的记录交给 `emit`。
    ///
    /// # 错误
    ///
    /// 字段转换失败（`Abort` 策略下）或 `emit` 返回错误。
    pub fn push_line<F>(&mut self, line: &str, mut emit: F) -> Result<(), ParseError>
    where
        F: FnMut(Record) -> Result<(), ParseError>,
    {
        self.stats.lines += 1;

        if is_record_start_line(line) {
            self.stats.boundaries += 1;
            if !self.current.is_empty() {
                self.flush(&mut emit)?;
            }
        }

        if !is_comment_line(line) && query_type(line).is_none() {
            return Ok(());
        }

        self.merge_line(line)
    }

    /// 输入结束：把最后一条记录收尾
    pub fn finish<F>(&mut self, mut emit: F) -> Result<(), ParseError>
    where
        F: FnMut(Record) -> Result<(), ParseError>,
    {
        if self.current.is_empty() {
            return Ok(());
        }
        self.flush(&mut emit)
    }

    fn merge_line(&mut self, line: &str) -> Result<(), ParseError> {
        if !is_metadata_line(line) {
            self.current
                .append_query(line, self.engine.query_join().separator());
        }

        self.engine.apply(line, &mut self.current)?;
        Ok(())
    }

    fn flush<F>(&mut self, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Record) -> Result<(), ParseError>,
    {
        let record = mem::take(&mut self.current);
        self.stats.finalized += 1;

        match self.finalizer.finalize(record) {
            Finalized::Emit(record) => {
                self.stats.emitted += 1;
                emit(record)
            }
            Finalized::Drop(reason) => {
                self.stats.dropped += 1;
                if reason.is_diagnostic() {
                    warn!(%reason, "dropping record");
                } else {
                    trace!(%reason, "dropping record");
                }
                Ok(())
            }
        }
    }
}
