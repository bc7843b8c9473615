//! 记录收尾
//!
//! 校验一条组装完成的记录，计算派生字段（起始时间、查询类型、指纹、表名），
//! 并决定记录是否输出。

use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use thiserror::Error;

use crate::fingerprint::{fingerprint, fingerprint_id};
use crate::parser::constants::{
    FINGERPRINT_ID_FIELD, QUERY_DIGEST_FIELD, QUERY_LENGTH_FIELD, QUERY_TIME_FIELD, QUERY_TYPE_FIELD,
    TABLE_FIELD, TIME_FIELD, TIME_START_FIELD,
};
use crate::record::{FieldValue, Record, format_timestamp};
use crate::tables::StatementKind;
use crate::tools::query_type;

/// 记录被丢弃的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    /// 缺少 time 或 query_time（或类型不对）
    #[error("record has no time/query_time")]
    MissingTiming,

    /// time - query_time 超出可表示的时间范围
    #[error("query_time {query_time:?} is out of range for time {time}")]
    TimeOutOfRange {
        time: String,
        query_time: std::time::Duration,
    },

    /// 查询文本无法解析
    #[error("unable to parse query {query:?}: {error}")]
    UnparsableQuery { query: String, error: String },

    /// 语句类型不在支持范围内
    #[error("unsupported statement {query:?}")]
    UnsupportedStatement { query: String },
}

impl DropReason {
    /// 是否需要输出诊断信息；缺少时间字段的记录静默丢弃
    pub fn is_diagnostic(&self) -> bool {
        !matches!(self, DropReason::MissingTiming)
    }
}

/// 收尾结果
#[derive(Debug, Clone, PartialEq)]
pub enum Finalized {
    /// 记录有效，应当输出
    Emit(Record),
    /// 记录被丢弃
    Drop(DropReason),
}

impl Finalized {
    pub fn is_emit(&self) -> bool {
        matches!(self, Finalized::Emit(_))
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Finalized::Emit(record) => Some(record),
            Finalized::Drop(_) => None,
        }
    }
}

/// 记录收尾器
#[derive(Debug)]
pub struct RecordFinalizer {
    dialect: MySqlDialect,
}

impl Default for RecordFinalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordFinalizer {
    pub fn new() -> Self {
        Self {
            dialect: MySqlDialect {},
        }
    }

    /// 校验记录并补全派生字段
    ///
    /// 1. 必须同时有时间戳类型的 `time` 和时长类型的 `query_time`；
    /// 2. `time_start = time - query_time`；
    /// 3. 有 `query` 时补充 `query_length`、`query_type`、`query_digest`、`fingerprintID`，
    ///    解析 SQL 并写入 `table`。解析失败或语句类型不支持时丢弃整条记录。
    pub fn finalize(&self, mut record: Record) -> Finalized {
        let (Some(time), Some(query_time)) =
            (record.timestamp(TIME_FIELD), record.duration(QUERY_TIME_FIELD))
        else {
            return Finalized::Drop(DropReason::MissingTiming);
        };

        let time_start = chrono::Duration::from_std(query_time)
            .ok()
            .and_then(|delta| time.checked_sub_signed(delta));
        let Some(time_start) = time_start else {
            return Finalized::Drop(DropReason::TimeOutOfRange {
                time: format_timestamp(&time),
                query_time,
            });
        };
        record.insert(TIME_START_FIELD, FieldValue::Timestamp(time_start));

        let Some(query) = record.query().map(str::to_owned) else {
            return Finalized::Emit(record);
        };

        record.insert(QUERY_LENGTH_FIELD, FieldValue::Int(query.chars().count() as i64));
        record.insert(
            QUERY_TYPE_FIELD,
            FieldValue::Str(query_type(&query).unwrap_or_default().to_string()),
        );

        let digest = fingerprint(&query);
        record.insert(FINGERPRINT_ID_FIELD, FieldValue::Str(fingerprint_id(&digest)));
        record.insert(QUERY_DIGEST_FIELD, FieldValue::Str(digest));

        let statements = match Parser::parse_sql(&self.dialect, &query) {
            Ok(statements) => statements,
            Err(err) => {
                return Finalized::Drop(DropReason::UnparsableQuery {
                    query,
                    error: err.to_string(),
                });
            }
        };
        let [statement] = statements.as_slice() else {
            let error = format!("expected one statement, found {}", statements.len());
            return Finalized::Drop(DropReason::UnparsableQuery { query, error });
        };

        match StatementKind::from(statement).table_names() {
            Some(tables) => record.insert(TABLE_FIELD, FieldValue::Str(tables)),
            None => return Finalized::Drop(DropReason::UnsupportedStatement { query }),
        }

        Finalized::Emit(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::constants::QUERY_FIELD;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn timed_record(query: Option<&str>) -> Record {
        let mut record = Record::new();
        record.insert(
            TIME_FIELD,
            FieldValue::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 10).unwrap()),
        );
        record.insert(QUERY_TIME_FIELD, FieldValue::Duration(Duration::from_secs(2)));
        if let Some(query) = query {
            record.insert(QUERY_FIELD, FieldValue::Str(query.to_string()));
        }
        record
    }

    #[test]
    fn derives_fields_for_select() {
        let finalizer = RecordFinalizer::new();
        let record = finalizer
            .finalize(timed_record(Some("SELECT 1 FROM x")))
            .into_record()
            .unwrap();

        assert_eq!(
            record.timestamp(TIME_START_FIELD),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 8).unwrap())
        );
        assert_eq!(record.int(QUERY_LENGTH_FIELD), Some(15));
        assert_eq!(record.str(QUERY_TYPE_FIELD), Some("SELECT"));
        assert_eq!(record.str(QUERY_DIGEST_FIELD), Some("select ? from x"));
        assert_eq!(
            record.str(FINGERPRINT_ID_FIELD).map(str::to_owned),
            Some(fingerprint_id("select ? from x"))
        );
        assert_eq!(record.str(TABLE_FIELD), Some("x"));
    }

    #[test]
    fn sub_second_query_time() {
        let mut record = timed_record(None);
        record.insert(QUERY_TIME_FIELD, FieldValue::Duration(Duration::from_micros(250_001)));
        let record = RecordFinalizer::new().finalize(record).into_record().unwrap();

        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 9).unwrap()
            + chrono::Duration::microseconds(749_999);
        assert_eq!(record.timestamp(TIME_START_FIELD), Some(expected));
    }

    #[test]
    fn record_without_query_is_emitted() {
        let record = RecordFinalizer::new()
            .finalize(timed_record(None))
            .into_record()
            .unwrap();
        assert!(record.contains(TIME_START_FIELD));
        assert!(!record.contains(TABLE_FIELD));
        assert!(!record.contains(QUERY_TYPE_FIELD));
    }

    #[test]
    fn missing_timing_is_silent_drop() {
        let mut record = Record::new();
        record.insert(QUERY_TIME_FIELD, FieldValue::Duration(Duration::from_secs(1)));
        let outcome = RecordFinalizer::new().finalize(record);
        assert_eq!(outcome, Finalized::Drop(DropReason::MissingTiming));
        assert!(!DropReason::MissingTiming.is_diagnostic());

        let mut record = timed_record(None);
        record.insert(QUERY_TIME_FIELD, FieldValue::Str("2".into()));
        assert_eq!(
            RecordFinalizer::new().finalize(record),
            Finalized::Drop(DropReason::MissingTiming)
        );
    }

    #[test]
    fn parse_failure_drops_record() {
        let outcome = RecordFinalizer::new().finalize(timed_record(Some("SELECT * FROM")));
        match outcome {
            Finalized::Drop(reason @ DropReason::UnparsableQuery { .. }) => {
                assert!(reason.is_diagnostic())
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn multiple_statements_are_a_parse_failure() {
        let outcome = RecordFinalizer::new().finalize(timed_record(Some("SELECT 1; SELECT 2")));
        assert!(matches!(
            outcome,
            Finalized::Drop(DropReason::UnparsableQuery { .. })
        ));
    }

    #[test]
    fn unsupported_statement_drops_record() {
        let outcome = RecordFinalizer::new().finalize(timed_record(Some("DROP TABLE t")));
        assert_eq!(
            outcome,
            Finalized::Drop(DropReason::UnsupportedStatement {
                query: "DROP TABLE t".into()
            })
        );
    }

    #[test]
    fn query_length_counts_characters() {
        let record = RecordFinalizer::new()
            .finalize(timed_record(Some("SELECT 'é' FROM t")))
            .into_record()
            .unwrap();
        assert_eq!(record.int(QUERY_LENGTH_FIELD), Some(17));
    }
}
