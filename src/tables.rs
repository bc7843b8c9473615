//! 表名解析
//!
//! 在 SQL 语法树中收集语句引用的表名。只遍历表表达式：FROM 列表、JOIN 的两侧、
//! 派生表（FROM 中的子查询）和嵌套 JOIN。别名、投影列、JOIN 条件和 WHERE 子句
//! 不会被展开，其中的列名和别名不会被误认为表名。

use std::collections::BTreeSet;

use sqlparser::ast::{FromTable, ObjectName, Query, SetExpr, Statement, TableFactor, TableWithJoins};

/// 语句类型，以及每种类型中需要解析表名的表表达式
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind<'a> {
    /// SELECT 的 FROM 列表
    Select(&'a [TableWithJoins]),
    /// INSERT / REPLACE 的目标表
    Insert(&'a ObjectName),
    /// UPDATE 的目标表（以及 UPDATE ... FROM）
    Update(Vec<&'a TableWithJoins>),
    /// DELETE 的 FROM 列表（以及 DELETE ... USING）
    Delete(Vec<&'a TableWithJoins>),
    /// 其它语句
    Unsupported,
}

impl<'a> From<&'a Statement> for StatementKind<'a> {
    fn from(statement: &'a Statement) -> Self {
        match statement {
            Statement::Query(query) => match query.body.as_ref() {
                SetExpr::Select(select) => StatementKind::Select(&select.from),
                _ => StatementKind::Unsupported,
            },
            Statement::Insert(insert) => StatementKind::Insert(&insert.table_name),
            Statement::Update { table, from, .. } => {
                StatementKind::Update(std::iter::once(table).chain(from.as_ref()).collect())
            }
            Statement::Delete(delete) => {
                let from = match &delete.from {
                    FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
                };
                let using = delete.using.iter().flatten();
                StatementKind::Delete(from.iter().chain(using).collect())
            }
            _ => StatementKind::Unsupported,
        }
    }
}

impl StatementKind<'_> {
    /// 语句引用的表名（去重、排序、逗号拼接）；不支持的语句返回 `None`
    pub fn table_names(&self) -> Option<String> {
        let mut resolver = TableNameResolver::default();
        match self {
            StatementKind::Select(tables) => resolver.walk_tables(tables.iter()),
            StatementKind::Insert(name) => resolver.add(name),
            StatementKind::Update(tables) | StatementKind::Delete(tables) => {
                resolver.walk_tables(tables.iter().copied())
            }
            StatementKind::Unsupported => return None,
        }
        Some(resolver.finish())
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, StatementKind::Unsupported)
    }
}

/// 表名收集器
#[derive(Debug, Default)]
pub struct TableNameResolver {
    names: BTreeSet<String>,
}

impl TableNameResolver {
    /// 表表达式列表：逐个展开
    pub fn walk_tables<'t>(&mut self, tables: impl IntoIterator<Item = &'t TableWithJoins>) {
        for table in tables {
            self.walk_table_with_joins(table);
        }
    }

    /// JOIN 只展开两侧的表因子，不进入 ON / USING 条件
    fn walk_table_with_joins(&mut self, table: &TableWithJoins) {
        self.walk_factor(&table.relation);
        for join in &table.joins {
            self.walk_factor(&join.relation);
        }
    }

    fn walk_factor(&mut self, factor: &TableFactor) {
        match factor {
            // 别名不展开
            TableFactor::Table { name, .. } => self.add(name),
            TableFactor::Derived { subquery, .. } => self.walk_query(subquery),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.walk_table_with_joins(table_with_joins),
            _ => {}
        }
    }

    fn walk_query(&mut self, query: &Query) {
        self.walk_set_expr(&query.body);
    }

    /// 子查询只展开 FROM，投影和 WHERE 不展开
    fn walk_set_expr(&mut self, expr: &SetExpr) {
        match expr {
            SetExpr::Select(select) => self.walk_tables(&select.from),
            SetExpr::Query(query) => self.walk_query(query),
            SetExpr::SetOperation { left, right, .. } => {
                self.walk_set_expr(left);
                self.walk_set_expr(right);
            }
            _ => {}
        }
    }

    /// 记录一个表名，空名字忽略
    pub fn add(&mut self, name: &ObjectName) {
        let rendered = render_name(name);
        if !rendered.is_empty() {
            self.names.insert(rendered);
        }
    }

    /// 排序后的表名，逗号拼接
    pub fn finish(self) -> String {
        self.names.into_iter().collect::<Vec<_>>().join(",")
    }
}

/// 不带引号的标识符，限定名以 `.` 连接
fn render_name(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|ident| ident.value.as_str())
        .collect::<Vec<_>>()
        .join(".")
}
