//! 字段规则引擎
//!
//! 每个已知的元数据字段对应一条规则：一个锚定在 `# ` 元数据行上的正则，
//! 加上把捕获文本转换为类型化值的方式。规则在启动时编译一次，之后只读。

use std::time::Duration;

use chrono::{NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use tracing::warn;

use crate::error::{ConvertError, ParseError};
use crate::parser::constants::DATETIME_LAYOUT;
use crate::parser_config::{FieldKind, FieldRuleDef, MalformedFieldPolicy, ParserConfig, QueryJoin};
use crate::record::{FieldValue, Record};
use crate::tools::is_metadata_line;

/// `Duration` 能换算成 i64 纳秒的最大整秒数
const MAX_DURATION_SECS: u64 = i64::MAX as u64 / 1_000_000_000;

/// 纳秒精度的小数位数
const NANOS_DIGITS: usize = 9;

/// 一条编译好的字段规则
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: &'static str,
    key: String,
    kind: FieldKind,
    pattern: Regex,
}

impl FieldRule {
    /// 编译规则
    ///
    /// 生成的正则形如 `^# .*Name: (capture)`，捕获形状由字段类型决定。
    pub fn compile(def: &FieldRuleDef) -> Result<Self, ParseError> {
        let source = format!(
            "^# .*{}: ({})",
            regex::escape(def.name),
            def.kind.capture_pattern()
        );
        let pattern = Regex::new(&source).map_err(|e| ParseError::InvalidRule {
            name: def.name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            name: def.name,
            key: def.name.to_lowercase(),
            kind: def.kind,
            pattern,
        })
    }

    /// 规则名（原始大小写）
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 写入记录时使用的小写键
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// 对一行文本执行匹配，返回捕获到的原始文本
    pub fn capture<'l>(&self, line: &'l str) -> Option<&'l str> {
        self.pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// 把捕获文本转换为类型化值
    pub fn convert(&self, raw: &str) -> Result<FieldValue, ParseError> {
        convert(raw, self.kind).map_err(|source| ParseError::InvalidField {
            field: self.name.to_string(),
            raw: raw.to_string(),
            source,
        })
    }
}

/// 字段规则引擎
///
/// 持有编译好的全部规则以及解析配置中的行为选项。
#[derive(Debug, Clone)]
pub struct FieldRuleEngine {
    rules: Vec<FieldRule>,
    malformed_field: MalformedFieldPolicy,
    query_join: QueryJoin,
}

impl FieldRuleEngine {
    /// 根据配置编译所有规则
    ///
    /// # 错误
    ///
    /// 规则名无法组成合法正则时返回 `ParseError::InvalidRule`。
    pub fn new(config: &ParserConfig) -> Result<Self, ParseError> {
        let rules = config
            .field_rules
            .iter()
            .map(FieldRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules,
            malformed_field: config.malformed_field,
            query_join: config.query_join,
        })
    }

    /// 使用默认 MySQL 配置构建
    pub fn mysql_default() -> Result<Self, ParseError> {
        Self::new(&ParserConfig::mysql_default())
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn query_join(&self) -> QueryJoin {
        self.query_join
    }

    pub fn malformed_field(&self) -> MalformedFieldPolicy {
        self.malformed_field
    }

    /// 按规则名匹配一行，返回原始捕获
    ///
    /// 规则名未知或不匹配时返回 `None`。
    pub fn capture<'l>(&self, line: &'l str, name: &str) -> Option<&'l str> {
        self.rules
            .iter()
            .find(|rule| rule.name == name)
            .and_then(|rule| rule.capture(line))
    }

    /// 对一行执行所有规则，把匹配到的字段写入记录（覆盖同名旧值）
    ///
    /// 返回写入的字段数。
    ///
    /// # 错误
    ///
    /// `MalformedFieldPolicy::Abort` 下任何一个字段转换失败都返回 `ParseError::InvalidField`；
    /// `Skip` 下只记录警告并跳过该字段。
    pub fn apply(&self, line: &str, record: &mut Record) -> Result<usize, ParseError> {
        // 所有规则都锚定在 "# " 上，其它行不可能匹配
        if !is_metadata_line(line) {
            return Ok(0);
        }

        let mut stored = 0;
        for rule in &self.rules {
            let Some(raw) = rule.capture(line) else {
                continue;
            };

            match rule.convert(raw) {
                Ok(value) => {
                    record.insert(rule.key.as_str(), value);
                    stored += 1;
                }
                Err(err) => match self.malformed_field {
                    MalformedFieldPolicy::Abort => return Err(err),
                    MalformedFieldPolicy::Skip => {
                        warn!(field = rule.name, raw, error = %err, "skipping malformed field");
                    }
                },
            }
        }

        Ok(stored)
    }
}

/// 把原始捕获按字段类型转换为类型化值
pub fn convert(raw: &str, kind: FieldKind) -> Result<FieldValue, ConvertError> {
    match kind {
        FieldKind::Datetime => parse_datetime(raw),
        FieldKind::Time => parse_seconds(raw).map(FieldValue::Duration),
        FieldKind::Int => raw
            .parse::<i64>()
            .map(FieldValue::Int)
            .map_err(|e| ConvertError::Int(e.to_string())),
        FieldKind::Bool => match raw {
            "Yes" => Ok(FieldValue::Bool(true)),
            "No" => Ok(FieldValue::Bool(false)),
            _ => Err(ConvertError::Bool),
        },
        FieldKind::String => Ok(FieldValue::Str(raw.to_string())),
    }
}

fn parse_datetime(raw: &str) -> Result<FieldValue, ConvertError> {
    NaiveDateTime::parse_from_str(raw, DATETIME_LAYOUT)
        .map(|naive| FieldValue::Timestamp(Utc.from_utc_datetime(&naive)))
        .map_err(|e| ConvertError::Datetime(e.to_string()))
}

/// 解析 `秒[.小数]` 形式的时长，精确到纳秒（多余的小数位截断）
///
/// 至少需要一位数字，最多一个小数点；整秒部分不能超出 i64 纳秒可表示的范围。
pub fn parse_seconds(raw: &str) -> Result<Duration, ConvertError> {
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(ConvertError::Duration);
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(ConvertError::Duration);
    }

    let secs = if whole.is_empty() {
        0
    } else {
        whole.parse::<u64>().map_err(|_| ConvertError::Duration)?
    };
    if secs > MAX_DURATION_SECS {
        return Err(ConvertError::Duration);
    }

    let mut nanos = 0u32;
    for (i, digit) in fraction.bytes().take(NANOS_DIGITS).enumerate() {
        nanos += u32::from(digit - b'0') * 10u32.pow((NANOS_DIGITS - 1 - i) as u32);
    }

    Ok(Duration::new(secs, nanos))
}
