//! # Selector
//!
//! CSS 选择器子集：
//!
//! | 语法 | 示例 |
//! |------|------|
//! | 类型 / 通配 | `section`、`*` |
//! | id / class | `#hero`、`.dark.wide` |
//! | 属性 | `[data-theme]`、`[data-theme=dark]`、`[data-theme="dark"]` |
//! | 组合器 | 后代（空白）、子代 `>` |
//! | 列表 | `a, b` |
//!
//! 伪类、兄弟组合器等其余语法一律视为无效选择器，由调用方跳过。

use super::{Dom, ElementId};
use crate::error::SelectorError;

/// 已解析的选择器列表
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

/// 由组合器连接的复合选择器链，最右侧为主体
#[derive(Debug, Clone, PartialEq)]
struct Complex {
    parts: Vec<Compound>,
    /// `combinators[i]` 连接 `parts[i]` 与 `parts[i + 1]`
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq)]
struct Attribute {
    name: String,
    value: Option<String>,
}

impl Selector {
    /// 解析选择器文本
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut alternatives = Vec::new();
        for part in split_top_level(input) {
            let part = part.trim();
            if part.is_empty() {
                return Err(SelectorError::new(input, "空选择器"));
            }
            alternatives.push(Parser::new(input, part).complex()?);
        }
        Ok(Self { alternatives })
    }

    /// 元素是否匹配任一备选
    pub fn matches<D: Dom + ?Sized>(&self, dom: &D, element: ElementId) -> bool {
        self.alternatives
            .iter()
            .any(|complex| complex.matches_at(dom, element, complex.parts.len() - 1))
    }
}

impl Complex {
    fn matches_at<D: Dom + ?Sized>(&self, dom: &D, element: ElementId, index: usize) -> bool {
        if !self.parts[index].matches(dom, element) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match self.combinators[index - 1] {
            Combinator::Child => dom
                .parent(element)
                .is_some_and(|parent| self.matches_at(dom, parent, index - 1)),
            Combinator::Descendant => {
                let mut current = dom.parent(element);
                while let Some(ancestor) = current {
                    if self.matches_at(dom, ancestor, index - 1) {
                        return true;
                    }
                    current = dom.parent(ancestor);
                }
                false
            }
        }
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
    }

    fn matches<D: Dom + ?Sized>(&self, dom: &D, element: ElementId) -> bool {
        if let Some(tag) = &self.tag
            && tag != "*"
            && !dom.tag_name(element).eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && dom.attribute(element, "id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|c| dom.has_class(element, c)) {
            return false;
        }
        self.attributes.iter().all(|attr| {
            match (dom.attribute(element, &attr.name), &attr.value) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
                (None, _) => false,
            }
        })
    }
}

/// 按顶层逗号切分（忽略方括号与引号内的逗号）
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}

struct Parser<'a> {
    /// 完整的原始输入（用于报错）
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, part: &str) -> Self {
        Self {
            source,
            chars: part.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> SelectorError {
        SelectorError::new(self.source, message)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        let mut parts = vec![self.compound()?];
        let mut combinators = Vec::new();

        loop {
            let saw_space = self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    combinators.push(Combinator::Child);
                }
                Some(_) if saw_space => combinators.push(Combinator::Descendant),
                Some(ch) => return Err(self.error(format!("不支持的语法 '{}'", ch))),
            }
            parts.push(self.compound()?);
        }

        Ok(Complex { parts, combinators })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();

        if self.peek() == Some('*') {
            self.pos += 1;
            compound.tag = Some("*".to_string());
        } else if self.peek().is_some_and(is_ident_char) {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attributes.push(self.attribute()?);
                }
                Some(ch) if ch.is_whitespace() || ch == '>' => break,
                None => break,
                Some(ch) => return Err(self.error(format!("不支持的语法 '{}'", ch))),
            }
        }

        if compound.is_empty() {
            return Err(self.error("缺少选择器"));
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("缺少标识符"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn attribute(&mut self) -> Result<Attribute, SelectorError> {
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();

        match self.peek() {
            Some(']') => {
                self.pos += 1;
                Ok(Attribute { name, value: None })
            }
            Some('=') => {
                self.pos += 1;
                self.skip_whitespace();
                let value = match self.peek() {
                    Some(q @ ('"' | '\'')) => {
                        self.pos += 1;
                        let start = self.pos;
                        while self.peek().is_some_and(|c| c != q) {
                            self.pos += 1;
                        }
                        if self.peek().is_none() {
                            return Err(self.error("未闭合的引号"));
                        }
                        let value: String = self.chars[start..self.pos].iter().collect();
                        self.pos += 1;
                        value
                    }
                    _ => self.ident()?,
                };
                self.skip_whitespace();
                if self.peek() != Some(']') {
                    return Err(self.error("未闭合的 '['"));
                }
                self.pos += 1;
                Ok(Attribute {
                    name,
                    value: Some(value),
                })
            }
            None => Err(self.error("未闭合的 '['")),
            Some(ch) => Err(self.error(format!("不支持的属性运算符 '{}'", ch))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDom, NodeSpec};

    fn fixture() -> (MemoryDom, ElementId, ElementId, ElementId) {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let main = dom.append(
            body,
            NodeSpec::new("main").id("content").class("site-main wide"),
        );
        let section = dom.append(
            main,
            NodeSpec::new("section")
                .class("hero dark")
                .attr("data-theme", "dark"),
        );
        let heading = dom.append(section, NodeSpec::new("h2").class("title"));
        (dom, main, section, heading)
    }

    #[test]
    fn test_simple_selectors() {
        let (dom, main, section, heading) = fixture();

        assert!(Selector::parse("main").unwrap().matches(&dom, main));
        assert!(Selector::parse("#content").unwrap().matches(&dom, main));
        assert!(Selector::parse(".wide.site-main").unwrap().matches(&dom, main));
        assert!(Selector::parse("section.hero").unwrap().matches(&dom, section));
        assert!(Selector::parse("*").unwrap().matches(&dom, heading));
        assert!(!Selector::parse(".hero").unwrap().matches(&dom, heading));
    }

    #[test]
    fn test_attribute_selectors() {
        let (dom, _, section, _) = fixture();

        assert!(Selector::parse("[data-theme]").unwrap().matches(&dom, section));
        assert!(Selector::parse("[data-theme=dark]").unwrap().matches(&dom, section));
        assert!(Selector::parse("[data-theme=\"dark\"]").unwrap().matches(&dom, section));
        assert!(!Selector::parse("[data-theme='light']").unwrap().matches(&dom, section));
    }

    #[test]
    fn test_combinators() {
        let (dom, _, _, heading) = fixture();

        assert!(Selector::parse("main h2").unwrap().matches(&dom, heading));
        assert!(Selector::parse("section > h2").unwrap().matches(&dom, heading));
        assert!(Selector::parse("#content .dark>.title").unwrap().matches(&dom, heading));
        assert!(!Selector::parse("main > h2").unwrap().matches(&dom, heading));
    }

    #[test]
    fn test_selector_list() {
        let (dom, main, section, _) = fixture();
        let selector = Selector::parse("footer, .hero").unwrap();

        assert!(selector.matches(&dom, section));
        assert!(!selector.matches(&dom, main));
    }

    #[test]
    fn test_invalid_selectors() {
        for input in ["", "div[", ".", "a:hover", "a + b", "a ~ b", "[x^=y]", "a,,b", "> a"] {
            assert!(Selector::parse(input).is_err(), "应拒绝: {input}");
        }
    }
}
