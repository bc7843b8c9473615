//! Parser 配置模块
//!
//! 提供字段规则定义和解析器配置。慢查询日志格式变化时只需更新配置，
//! 而不需要修改核心解析逻辑。

use std::collections::HashMap;

use crate::parser::constants::FIELD_CATALOG;

/// 字段值类型
///
/// 决定规则的捕获形状以及捕获值的转换方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// 绝对时间，贪婪捕获整行剩余部分
    Datetime,
    /// 单个单词，原样保存
    String,
    /// 秒数，可带小数
    Time,
    /// 64 位有符号整数
    Int,
    /// Yes / No
    Bool,
}

impl FieldKind {
    /// 规则捕获组的正则形状
    pub fn capture_pattern(self) -> &'static str {
        match self {
            FieldKind::Datetime => ".*",
            FieldKind::String | FieldKind::Bool => "[0-9A-Za-z_]+",
            FieldKind::Time => "[0-9.]+",
            FieldKind::Int => "[0-9]+",
        }
    }
}

/// 单条字段规则定义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRuleDef {
    /// 日志中出现的字段名（区分大小写），如 "Query_time"
    pub name: &'static str,

    /// 字段类型
    pub kind: FieldKind,
}

/// 元数据字段值无法转换时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedFieldPolicy {
    /// 终止整个解析流程
    #[default]
    Abort,
    /// 记录一条警告并忽略该字段
    Skip,
}

/// 多行查询文本的拼接方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryJoin {
    /// 直接拼接，不插入分隔符
    #[default]
    Concat,
    /// 以换行符拼接
    Newline,
}

impl QueryJoin {
    pub fn separator(self) -> &'static str {
        match self {
            QueryJoin::Concat => "",
            QueryJoin::Newline => "\n",
        }
    }
}

/// Parser 配置
///
/// 定义解析器支持的字段及其行为，启动时构建一次，之后只读。
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// 字段规则定义列表
    pub field_rules: Vec<FieldRuleDef>,

    /// 字段值格式错误时的处理方式
    pub malformed_field: MalformedFieldPolicy,

    /// 多行查询文本的拼接方式
    pub query_join: QueryJoin,
}

impl ParserConfig {
    /// MySQL 慢查询日志的默认配置
    pub fn mysql_default() -> Self {
        Self {
            field_rules: FIELD_CATALOG
                .iter()
                .map(|&(name, kind)| FieldRuleDef { name, kind })
                .collect(),
            malformed_field: MalformedFieldPolicy::Abort,
            query_join: QueryJoin::Concat,
        }
    }

    pub fn with_malformed_field(mut self, policy: MalformedFieldPolicy) -> Self {
        self.malformed_field = policy;
        self
    }

    pub fn with_query_join(mut self, join: QueryJoin) -> Self {
        self.query_join = join;
        self
    }

    /// 创建字段名到定义的映射（用于快速查找）
    pub fn field_rule_map(&self) -> HashMap<&'static str, &FieldRuleDef> {
        self.field_rules.iter().map(|def| (def.name, def)).collect()
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::mysql_default()
    }
}
