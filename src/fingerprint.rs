//! 查询指纹
//!
//! 把 SQL 文本归一化为去掉字面量的形式，用于把结构相同的查询归为一组：
//! 小写化、去注释、压缩空白、字符串和数字字面量替换为 `?`，
//! `IN (...)` 列表和多行 `VALUES` 折叠为 `(?+)`。

use once_cell::sync::Lazy;
use regex::Regex;

/// `in (?, ?, ?)` → `in(?+)`
static IN_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bin ?\( ?\?(?: ?, ?\?)* ?\)").expect("valid IN list pattern")
});

/// `values (?, ?), (?, ?)` → `values(?+)`
static VALUES_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(values?) ?\( ?\?(?: ?, ?\?)* ?\)(?: ?, ?\( ?\?(?: ?, ?\?)* ?\))*")
        .expect("valid VALUES list pattern")
});

/// `limit ?, ?` / `limit ? offset ?` → `limit ?`
static LIMIT_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\blimit \?(?: ?, ?\?| offset \?)").expect("valid LIMIT pattern")
});

/// 计算查询指纹
///
/// # 示例
///
/// ```
/// use slowlog_poke::fingerprint::fingerprint;
///
/// assert_eq!(
///     fingerprint("SELECT * FROM users WHERE id = 42"),
///     "select * from users where id = ?"
/// );
/// ```
pub fn fingerprint(query: &str) -> String {
    let normalized = normalize(query);
    let collapsed = IN_LIST.replace_all(&normalized, "in(?+)");
    let collapsed = VALUES_LIST.replace_all(&collapsed, "$1(?+)");
    let collapsed = LIMIT_PAIR.replace_all(&collapsed, "limit ?");
    collapsed.into_owned()
}

/// 指纹 ID：指纹 MD5 摘要第 8..16 字节的大写十六进制（16 个字符）
pub fn fingerprint_id(fingerprint: &str) -> String {
    let digest = format!("{:x}", md5::compute(fingerprint.as_bytes()));
    digest[16..32].to_uppercase()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// 逐字符扫描：去注释、替换字面量、压缩空白、小写化
fn normalize(query: &str) -> String {
    let chars: Vec<char> = query.chars().collect();
    let mut out = String::with_capacity(query.len());
    let mut pending_space = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            pending_space = true;
            i += 1;
        } else if c == '#' || (c == '-' && next == Some('-') && is_comment_dash(&chars, i)) {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            pending_space = true;
        } else if c == '/' && next == Some('*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i = (i + 2).min(chars.len());
            pending_space = true;
        } else if c == '\'' || c == '"' {
            i = skip_quoted(&chars, i);
            emit(&mut out, &mut pending_space, "?");
        } else if c == '`' {
            let start = i + 1;
            i = start;
            while i < chars.len() && chars[i] != '`' {
                i += 1;
            }
            let ident: String = chars[start..i].iter().collect();
            emit(&mut out, &mut pending_space, &ident.to_lowercase());
            i = (i + 1).min(chars.len());
        } else if c.is_ascii_digit() {
            i = skip_number(&chars, i);
            emit(&mut out, &mut pending_space, "?");
        } else if is_word_char(c) {
            let start = i;
            while i < chars.len() && is_word_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            emit(&mut out, &mut pending_space, &word.to_lowercase());
        } else {
            let mut buf = [0u8; 4];
            emit(&mut out, &mut pending_space, c.encode_utf8(&mut buf));
            i += 1;
        }
    }

    while out.ends_with(';') || out.ends_with(' ') {
        out.pop();
    }
    out
}

/// `--` 只有后跟空白或位于末尾时才是注释
fn is_comment_dash(chars: &[char], i: usize) -> bool {
    chars.get(i + 2).is_none_or(|c| c.is_whitespace())
}

fn emit(out: &mut String, pending_space: &mut bool, token: &str) {
    if *pending_space && !out.is_empty() {
        out.push(' ');
    }
    *pending_space = false;
    out.push_str(token);
}

/// 跳过一个引号字符串（支持反斜杠转义和重复引号），返回结束后的位置
fn skip_quoted(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => {
                if chars.get(i + 1) == Some(&quote) {
                    i += 2;
                } else {
                    return i + 1;
                }
            }
            _ => i += 1,
        }
    }
    chars.len()
}

/// 跳过一个数字字面量（十进制、小数、科学计数法、0x 十六进制），返回结束后的位置
fn skip_number(chars: &[char], start: usize) -> usize {
    let mut i = start;
    if chars[i] == '0' && matches!(chars.get(i + 1), Some('x') | Some('X')) {
        i += 2;
        while i < chars.len() && chars[i].is_ascii_hexdigit() {
            i += 1;
        }
        return i;
    }

    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
        i += 1;
    }
    if matches!(chars.get(i), Some('e') | Some('E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+') | Some('-')) {
            j += 1;
        }
        if chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
            i = j;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_are_replaced() {
        assert_eq!(
            fingerprint("SELECT * FROM users WHERE id = 42"),
            "select * from users where id = ?"
        );
        assert_eq!(
            fingerprint("SELECT name FROM t WHERE a = 'x''y' AND b = \"q\\\"z\" AND c = 1.5e3"),
            "select name from t where a = ? and b = ? and c = ?"
        );
        assert_eq!(fingerprint("SELECT 0xFF"), "select ?");
    }

    #[test]
    fn identifiers_with_digits_are_kept() {
        assert_eq!(fingerprint("SELECT c1 FROM t2"), "select c1 from t2");
    }

    #[test]
    fn whitespace_comments_and_quotes() {
        assert_eq!(
            fingerprint("SELECT  *\n FROM `Users`  /* hint */ WHERE name='bob';"),
            "select * from users where name=?"
        );
        assert_eq!(
            fingerprint("SELECT 1 -- trailing comment\nFROM dual"),
            "select ? from dual"
        );
        assert_eq!(fingerprint("SELECT 1 # note"), "select ?");
    }

    #[test]
    fn lists_are_collapsed() {
        assert_eq!(
            fingerprint("SELECT a FROM t WHERE b IN (1, 2, 3)"),
            "select a from t where b in(?+)"
        );
        assert_eq!(
            fingerprint("INSERT INTO t (a,b) VALUES (1,'x'),(2,'y')"),
            "insert into t (a,b) values(?+)"
        );
        assert_eq!(
            fingerprint("SELECT * FROM t LIMIT 10, 20"),
            "select * from t limit ?"
        );
    }

    #[test]
    fn equal_shapes_share_an_id() {
        let a = fingerprint("SELECT * FROM t WHERE id = 1");
        let b = fingerprint("select *   from t where id = 99");
        assert_eq!(a, b);

        let id = fingerprint_id(&a);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_eq!(id, fingerprint_id(&b));
        assert_ne!(id, fingerprint_id("select * from u where id = ?"));
    }
}
