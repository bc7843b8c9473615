use memchr::memmem;

use crate::parser::constants::{COMMENT_PREFIX, METADATA_PREFIX, QUERY_KEYWORDS, RECORD_START_MARKER};

/// 判断一行日志是否为记录起始行。
///
/// 只有以 `# Time: ` 开头的行才是边界，其它注释行（`# User@Host:`、
/// `# Query_time:` 等）只参与字段提取，不会开始新记录。
#[inline]
pub fn is_record_start_line(line: &str) -> bool {
    line.starts_with(RECORD_START_MARKER)
}

/// 是否为注释行（以 `#` 开头）
#[inline]
pub fn is_comment_line(line: &str) -> bool {
    line.starts_with(COMMENT_PREFIX)
}

/// 是否为元数据行（以 `# ` 开头），元数据行不计入查询文本
#[inline]
pub fn is_metadata_line(line: &str) -> bool {
    line.starts_with(METADATA_PREFIX)
}

/// 判断文本的语句类型
///
/// 在文本中查找每个关键字的首次出现位置（子串匹配，区分大小写，不考虑单词边界），
/// 返回位置最靠左的关键字；位置相同时取 [`QUERY_KEYWORDS`] 中靠前的一个。
/// 没有任何关键字时返回 `None`。
pub fn query_type(text: &str) -> Option<&'static str> {
    let haystack = text.as_bytes();
    let mut best: Option<(usize, &'static str)> = None;

    for keyword in QUERY_KEYWORDS {
        let Some(pos) = memmem::find(haystack, keyword.as_bytes()) else {
            continue;
        };
        match best {
            Some((best_pos, _)) if best_pos <= pos => {}
            _ => best = Some((pos, keyword)),
        }
    }

    best.map(|(_, keyword)| keyword)
}
