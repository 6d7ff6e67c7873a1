//! 元素选择器模块
//!
//! 解析并匹配 CSS 选择器的结构化子集，用于从文档中挑选需要本地化的元素。
//! 词法分析交给 `cssparser`，匹配直接在 `markup5ever_rcdom` 节点上进行。
//!
//! # 支持的语法
//!
//! - 类型选择器 `div`、通配符 `*`
//! - `#id`、`.class`
//! - 属性选择器 `[a]`、`[a=v]`、`[a~=v]`、`[a|=v]`、`[a^=v]`、`[a$=v]`、`[a*=v]`，
//!   可带 `i` / `s` 标记
//! - 组合符：后代（空白）、`>`、`+`、`~`
//! - 选择器列表 `a, b`
//!
//! 伪类与伪元素不受支持，解析时返回错误。

use cssparser::{ParseError, Parser, ParserInput, Token};
use markup5ever_rcdom::{Handle, RcDom};

use super::dom::{
    find_elements, get_node_attr, get_node_name, get_parent_element,
    get_preceding_sibling_elements,
};
use super::utils::split_html_whitespace;

/// 属性匹配方式
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrOperator {
    /// `[a]`
    Exists,
    /// `[a=v]`
    Equals(String),
    /// `[a~=v]`
    Includes(String),
    /// `[a|=v]`
    DashMatch(String),
    /// `[a^=v]`
    Prefix(String),
    /// `[a$=v]`
    Suffix(String),
    /// `[a*=v]`
    Substring(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrSelector {
    pub name: String,
    pub operator: AttrOperator,
    pub case_insensitive: bool,
}

/// 复合选择器，例如 `div.note[data-i18n]`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub universal: bool,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrSelector>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

/// 由组合符连接的复合选择器序列
///
/// `combinators[i]` 连接 `compounds[i]` 与 `compounds[i + 1]`。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplexSelector {
    pub compounds: Vec<CompoundSelector>,
    pub combinators: Vec<Combinator>,
}

/// 逗号分隔的选择器列表
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl CompoundSelector {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
    }

    pub fn matches(&self, node: &Handle) -> bool {
        let Some(node_name) = get_node_name(node) else {
            return false;
        };

        if let Some(tag) = &self.tag {
            if !node_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if get_node_attr(node, "id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }

        if !self.classes.is_empty() {
            let class_attr = get_node_attr(node, "class").unwrap_or_default();
            let node_classes: Vec<&str> = split_html_whitespace(&class_attr).collect();
            if !self
                .classes
                .iter()
                .all(|class| node_classes.contains(&class.as_str()))
            {
                return false;
            }
        }

        self.attrs.iter().all(|attr| attr.matches(node))
    }
}

impl AttrSelector {
    pub fn matches(&self, node: &Handle) -> bool {
        let Some(actual) = get_node_attr(node, &self.name) else {
            return false;
        };

        let fold = |s: &str| {
            if self.case_insensitive {
                s.to_ascii_lowercase()
            } else {
                s.to_string()
            }
        };
        let actual = fold(&actual);

        match &self.operator {
            AttrOperator::Exists => true,
            AttrOperator::Equals(value) => actual == fold(value),
            AttrOperator::Includes(value) => {
                let value = fold(value);
                !value.is_empty() && split_html_whitespace(&actual).any(|item| item == value)
            }
            AttrOperator::DashMatch(value) => {
                let value = fold(value);
                actual == value || actual.starts_with(&format!("{value}-"))
            }
            AttrOperator::Prefix(value) => !value.is_empty() && actual.starts_with(&fold(value)),
            AttrOperator::Suffix(value) => !value.is_empty() && actual.ends_with(&fold(value)),
            AttrOperator::Substring(value) => !value.is_empty() && actual.contains(&fold(value)),
        }
    }
}

impl ComplexSelector {
    pub fn matches(&self, node: &Handle) -> bool {
        let last = self.compounds.len() - 1;
        self.compounds[last].matches(node) && self.matches_leftwards(node, last)
    }

    /// `node` 已匹配 `compounds[index]`，继续向左检查其余部分
    fn matches_leftwards(&self, node: &Handle, index: usize) -> bool {
        if index == 0 {
            return true;
        }

        let compound = &self.compounds[index - 1];
        let candidate_matches =
            |candidate: &Handle| compound.matches(candidate) && self.matches_leftwards(candidate, index - 1);

        match self.combinators[index - 1] {
            Combinator::Child => get_parent_element(node).is_some_and(|p| candidate_matches(&p)),
            Combinator::Descendant => {
                let mut ancestor = get_parent_element(node);
                while let Some(current) = ancestor {
                    if candidate_matches(&current) {
                        return true;
                    }
                    ancestor = get_parent_element(&current);
                }
                false
            }
            Combinator::NextSibling => get_preceding_sibling_elements(node)
                .first()
                .is_some_and(|sibling| candidate_matches(sibling)),
            Combinator::SubsequentSibling => get_preceding_sibling_elements(node)
                .iter()
                .any(|sibling| candidate_matches(sibling)),
        }
    }
}

impl SelectorList {
    /// 解析选择器字符串
    pub fn parse(selector: &str) -> Result<SelectorList, String> {
        let mut input = ParserInput::new(selector);
        let mut parser = Parser::new(&mut input);

        parse_selector_list(&mut parser).map_err(|e| {
            format!(
                "invalid selector \"{}\" at column {}: {}",
                selector,
                e.location.column,
                describe_parse_error(&e)
            )
        })
    }

    pub fn matches(&self, node: &Handle) -> bool {
        self.selectors.iter().any(|selector| selector.matches(node))
    }

    /// 按文档顺序返回所有匹配的元素
    pub fn select(&self, dom: &RcDom) -> Vec<Handle> {
        find_elements(&dom.document, &|node| self.matches(node))
    }
}

fn describe_parse_error(error: &ParseError<'_, String>) -> String {
    match &error.kind {
        cssparser::ParseErrorKind::Custom(message) => message.clone(),
        cssparser::ParseErrorKind::Basic(basic) => format!("{basic:?}"),
    }
}

fn parse_selector_list<'i>(
    parser: &mut Parser<'i, '_>,
) -> Result<SelectorList, ParseError<'i, String>> {
    let mut selectors = Vec::new();
    let mut compounds: Vec<CompoundSelector> = Vec::new();
    let mut combinators: Vec<Combinator> = Vec::new();
    let mut current = CompoundSelector::default();
    let mut pending: Option<Combinator> = None;

    loop {
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) => {
                if !current.is_empty() {
                    compounds.push(std::mem::take(&mut current));
                    pending = Some(Combinator::Descendant);
                }
            }
            Token::Delim(c @ ('>' | '+' | '~')) => {
                if !current.is_empty() {
                    compounds.push(std::mem::take(&mut current));
                }
                if compounds.is_empty() {
                    return Err(parser.new_custom_error(format!("dangling combinator '{c}'")));
                }
                // 空白之后的显式组合符替换掉后代组合符，两个显式组合符相连则无效
                if pending.is_some_and(|combinator| combinator != Combinator::Descendant) {
                    return Err(parser.new_custom_error(format!("unexpected combinator '{c}'")));
                }
                pending = Some(match c {
                    '>' => Combinator::Child,
                    '+' => Combinator::NextSibling,
                    _ => Combinator::SubsequentSibling,
                });
            }
            Token::Comma => {
                selectors.push(finish_complex(
                    parser,
                    &mut compounds,
                    &mut combinators,
                    &mut current,
                    &mut pending,
                )?);
            }
            simple => {
                if current.is_empty() && !compounds.is_empty() {
                    match pending.take() {
                        Some(combinator) => combinators.push(combinator),
                        None => {
                            return Err(parser.new_custom_error("missing combinator".to_string()))
                        }
                    }
                }
                parse_simple_selector(parser, simple, &mut current)?;
            }
        }
    }

    selectors.push(finish_complex(
        parser,
        &mut compounds,
        &mut combinators,
        &mut current,
        &mut pending,
    )?);

    Ok(SelectorList { selectors })
}

fn finish_complex<'i>(
    parser: &Parser<'i, '_>,
    compounds: &mut Vec<CompoundSelector>,
    combinators: &mut Vec<Combinator>,
    current: &mut CompoundSelector,
    pending: &mut Option<Combinator>,
) -> Result<ComplexSelector, ParseError<'i, String>> {
    if !current.is_empty() {
        compounds.push(std::mem::take(current));
    } else if compounds.is_empty() {
        return Err(parser.new_custom_error("empty selector".to_string()));
    } else if pending.is_some_and(|combinator| combinator != Combinator::Descendant) {
        return Err(parser.new_custom_error("selector ends with a combinator".to_string()));
    }
    *pending = None;

    Ok(ComplexSelector {
        compounds: std::mem::take(compounds),
        combinators: std::mem::take(combinators),
    })
}

fn parse_simple_selector<'i>(
    parser: &mut Parser<'i, '_>,
    token: Token<'i>,
    current: &mut CompoundSelector,
) -> Result<(), ParseError<'i, String>> {
    match token {
        Token::Ident(name) => {
            if current.tag.is_some() || current.universal || !current.is_empty() {
                return Err(parser.new_custom_error(format!(
                    "type selector \"{name}\" must come first in a compound selector"
                )));
            }
            current.tag = Some(name.to_ascii_lowercase());
        }
        Token::Delim('*') => {
            if !current.is_empty() {
                return Err(parser.new_custom_error(
                    "universal selector must come first in a compound selector".to_string(),
                ));
            }
            current.universal = true;
        }
        Token::IDHash(id) | Token::Hash(id) => {
            current.id = Some(id.to_string());
        }
        Token::Delim('.') => {
            let class = parser.expect_ident_cloned()?;
            current.classes.push(class.to_string());
        }
        Token::SquareBracketBlock => {
            let attr = parser.parse_nested_block(parse_attribute_selector)?;
            current.attrs.push(attr);
        }
        Token::Colon => {
            return Err(parser.new_custom_error(
                "pseudo-classes and pseudo-elements are not supported".to_string(),
            ));
        }
        other => {
            return Err(parser.new_custom_error(format!("unexpected token {other:?}")));
        }
    }

    Ok(())
}

fn parse_attribute_selector<'i>(
    parser: &mut Parser<'i, '_>,
) -> Result<AttrSelector, ParseError<'i, String>> {
    let name = parser.expect_ident_cloned()?.to_string();

    if parser.is_exhausted() {
        return Ok(AttrSelector {
            name,
            operator: AttrOperator::Exists,
            case_insensitive: false,
        });
    }

    let operator_token = parser.next()?.clone();
    let value = parser.expect_ident_or_string()?.to_string();
    let operator = match operator_token {
        Token::Delim('=') => AttrOperator::Equals(value),
        Token::IncludeMatch => AttrOperator::Includes(value),
        Token::DashMatch => AttrOperator::DashMatch(value),
        Token::PrefixMatch => AttrOperator::Prefix(value),
        Token::SuffixMatch => AttrOperator::Suffix(value),
        Token::SubstringMatch => AttrOperator::Substring(value),
        other => {
            return Err(
                parser.new_custom_error(format!("unexpected attribute operator {other:?}"))
            )
        }
    };

    let mut case_insensitive = false;
    if !parser.is_exhausted() {
        let flag = parser.expect_ident_cloned()?;
        if flag.eq_ignore_ascii_case("i") {
            case_insensitive = true;
        } else if !flag.eq_ignore_ascii_case("s") {
            return Err(parser.new_custom_error(format!("unknown attribute flag \"{flag}\"")));
        }
    }
    parser.expect_exhausted()?;

    Ok(AttrSelector {
        name,
        operator,
        case_insensitive,
    })
}
