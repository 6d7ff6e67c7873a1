/// ASCII 空白字符
pub const WHITESPACES: &[char] = &[' ', '\t', '\n', '\x0c', '\r'];

/// 没有内容的 HTML 元素，序列化时不输出子节点
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// 按 HTML 空白字符拆分属性值（如 `class`），忽略空项
pub fn split_html_whitespace(value: &str) -> impl Iterator<Item = &str> {
    value.split(WHITESPACES).filter(|item| !item.is_empty())
}

/// 检查语言代码能否作为单独的目录名使用
pub fn is_valid_language_segment(language: &str) -> bool {
    !language.is_empty()
        && language != "."
        && language != ".."
        && !language.contains(['/', '\\'])
        && !language.contains(WHITESPACES)
}
