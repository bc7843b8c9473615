//! SlowlogParser - 从 Reader 流式读取并组装记录
//!
//! 提供了一个迭代器，可以从任何实现了 `BufRead` trait 的源中逐条读取输出记录。

use std::collections::VecDeque;
use std::io::{self, BufRead};

use crate::error::ParseError;
use crate::parser::assembler::{AssemblerStats, RecordAssembler};
use crate::parser::field_rules::FieldRuleEngine;
use crate::record::Record;

/// 读取一个逻辑行
///
/// 物理行再长也会被完整读入；行尾的 `\n` / `\r` 被去掉，非法 UTF-8 按替换字符处理。
/// 输入结束时返回 `None`。
pub fn read_logical_line<R: BufRead>(reader: &mut R, buffer: &mut Vec<u8>) -> io::Result<Option<String>> {
    buffer.clear();
    let bytes_read = reader.read_until(b'\n', buffer)?;
    if bytes_read == 0 {
        return Ok(None);
    }

    let mut len = buffer.len();
    while len > 0 && matches!(buffer[len - 1], b'\n' | b'\r') {
        len -= 1;
    }
    buffer.truncate(len);

    Ok(Some(String::from_utf8_lossy(buffer).into_owned()))
}

/// 从 Reader 中按行读取并输出有效记录的迭代器
///
/// 被丢弃的记录不会出现在迭代结果中。遇到致命错误时先交出此前已经完成的记录，
/// 再返回一次 `Err`，之后迭代结束。
///
/// # 示例
///
/// ```
/// use slowlog_poke::parser::{FieldRuleEngine, SlowlogParser};
///
/// let log = "# Time: 2024-01-01T00:00:10.000000Z\n# Query_time: 2.000000\nSELECT 1 FROM x\n";
/// let engine = FieldRuleEngine::mysql_default()?;
///
/// let records: Vec<_> = SlowlogParser::new(log.as_bytes(), &engine).collect::<Result<_, _>>()?;
/// assert_eq!(records.len(), 1);
/// # Ok::<(), slowlog_poke::ParseError>(())
/// ```
pub struct SlowlogParser<'e, R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
    assembler: RecordAssembler<'e>,
    pending: VecDeque<Record>,
    error: Option<ParseError>,
    finished: bool,
}

impl<'e, R: BufRead> SlowlogParser<'e, R> {
    pub fn new(reader: R, engine: &'e FieldRuleEngine) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(4096),
            assembler: RecordAssembler::new(engine),
            pending: VecDeque::new(),
            error: None,
            finished: false,
        }
    }

    pub fn stats(&self) -> AssemblerStats {
        self.assembler.stats()
    }

    /// 读取并处理一个逻辑行，输入结束时把最后一条记录收尾
    fn advance(&mut self) -> Result<(), ParseError> {
        let line = read_logical_line(&mut self.reader, &mut self.buffer)?;

        let pending = &mut self.pending;
        let sink = |record: Record| -> Result<(), ParseError> {
            pending.push_back(record);
            Ok(())
        };

        match line {
            Some(line) => self.assembler.push_line(&line, sink),
            None => {
                self.finished = true;
                self.assembler.finish(sink)
            }
        }
    }
}

impl<R: BufRead> Iterator for SlowlogParser<'_, R> {
    type Item = Result<Record, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if let Some(err) = self.error.take() {
                return Some(Err(err));
            }
            if self.finished {
                return None;
            }
            if let Err(err) = self.advance() {
                self.finished = true;
                self.error = Some(err);
            }
        }
    }
}
