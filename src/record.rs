use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::parser::constants::{DATETIME_LAYOUT, QUERY_FIELD};

/// 记录中的一个字段值
///
/// 内部保留类型化的值，只在序列化时转换为外部的规范形式：
/// 时间戳输出为 `YYYY-MM-DDTHH:MM:SS.ffffffZ` 字符串，时长输出为秒数（浮点）。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 绝对时间（UTC）
    Timestamp(DateTime<Utc>),
    /// 时长
    Duration(Duration),
    /// 64 位有符号整数
    Int(i64),
    /// 布尔值
    Bool(bool),
    /// 字符串
    Str(String),
}

impl FieldValue {
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            FieldValue::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// 按固定格式渲染时间戳
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(DATETIME_LAYOUT).to_string()
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Timestamp(ts) => serializer.serialize_str(&format_timestamp(ts)),
            FieldValue::Duration(d) => serializer.serialize_f64(d.as_secs_f64()),
            FieldValue::Int(v) => serializer.serialize_i64(*v),
            FieldValue::Bool(v) => serializer.serialize_bool(*v),
            FieldValue::Str(s) => serializer.serialize_str(s),
        }
    }
}

/// 一条慢查询日志记录
///
/// 字段名到类型化值的映射。键按字典序保存，序列化后的 JSON 对象键序稳定。
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// 写入字段，覆盖同名旧值
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get(key).and_then(FieldValue::as_timestamp)
    }

    pub fn duration(&self, key: &str) -> Option<Duration> {
        self.get(key).and_then(FieldValue::as_duration)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(FieldValue::as_int)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(FieldValue::as_bool)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    /// 累积的原始 SQL 文本
    pub fn query(&self) -> Option<&str> {
        self.str(QUERY_FIELD)
    }

    /// 把一行查询文本追加到 `query` 字段，`separator` 插在已有文本和新行之间
    pub fn append_query(&mut self, line: &str, separator: &str) {
        match self.fields.get_mut(QUERY_FIELD) {
            Some(FieldValue::Str(query)) => {
                query.push_str(separator);
                query.push_str(line);
            }
            _ => self.insert(QUERY_FIELD, FieldValue::Str(line.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 序列化为单行 JSON
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn canonical_json_renders_typed_values() {
        let mut record = Record::new();
        record.insert(
            "time",
            FieldValue::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 10).unwrap()),
        );
        record.insert("query_time", FieldValue::Duration(Duration::from_millis(1500)));
        record.insert("rows_sent", FieldValue::Int(3));
        record.insert("qc_hit", FieldValue::Bool(false));
        record.insert("schema", FieldValue::Str("shop".into()));

        let value: serde_json::Value = serde_json::from_str(&record.to_json_line().unwrap()).unwrap();
        assert_eq!(value["time"], "2024-01-01T00:00:10.000000Z");
        assert_eq!(value["query_time"], 1.5);
        assert_eq!(value["rows_sent"], 3);
        assert_eq!(value["qc_hit"], false);
        assert_eq!(value["schema"], "shop");
    }

    #[test]
    fn json_keys_are_sorted() {
        let mut record = Record::new();
        record.insert("table", FieldValue::Str("t".into()));
        record.insert("query", FieldValue::Str("SELECT 1".into()));
        record.insert("fingerprintID", FieldValue::Str("AB".into()));
        assert_eq!(
            record.to_json_line().unwrap(),
            r#"{"fingerprintID":"AB","query":"SELECT 1","table":"t"}"#
        );
    }

    #[test]
    fn append_query_uses_separator() {
        let mut record = Record::new();
        record.append_query("SELECT a", "");
        record.append_query("FROM t", "");
        assert_eq!(record.query(), Some("SELECT aFROM t"));

        let mut record = Record::new();
        record.append_query("SELECT a", "\n");
        record.append_query("FROM t", "\n");
        assert_eq!(record.query(), Some("SELECT a\nFROM t"));
    }

    #[test]
    fn typed_getters_reject_other_variants() {
        let mut record = Record::new();
        record.insert("time", FieldValue::Str("not a timestamp".into()));
        assert!(record.timestamp("time").is_none());
        assert_eq!(record.str("time"), Some("not a timestamp"));
    }
}
