#![forbid(unsafe_code)]

//! Minimal CSS selector engine for the in-memory document.
//!
//! Browsers match selectors natively; this engine exists so [`MemoryDom`]
//! answers the same queries the controllers send to a real page.
//!
//! Supported grammar:
//!
//! ```text
//! list     := complex ( "," complex )*
//! complex  := compound ( WS compound )*          descendant combinator only
//! compound := ( tag | "*" )? ( "#" id | "." class | "[" attr ( op value )? "]" )*
//! op       := "=" | "^=" | "$=" | "*="
//! ```
//!
//! [`MemoryDom`]: crate::dom::memory::MemoryDom

use std::fmt;

/// Read access to an element, as needed for matching.
pub trait ElementView: Sized {
    /// Lowercase tag name.
    fn tag(&self) -> &str;
    /// Attribute value.
    fn attr(&self, name: &str) -> Option<&str>;
    /// Parent element.
    fn parent(&self) -> Option<Self>;

    /// Whether the `class` attribute lists `class`.
    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }
}

/// Selector parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// Empty selector or empty list entry.
    Empty,
    /// Character not valid at this position.
    Unexpected { at: usize, found: char },
    /// Input ended inside `[...]` or a quoted value.
    Unterminated,
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty selector"),
            Self::Unexpected { at, found } => write!(f, "unexpected {found:?} at {at}"),
            Self::Unterminated => write!(f, "unterminated selector"),
        }
    }
}

impl std::error::Error for SelectorError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    op: AttrOp,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    universal: bool,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
    }

    fn matches<E: ElementView>(&self, el: &E) -> bool {
        if let Some(tag) = &self.tag
            && !el.tag().eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && el.attr("id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|test| {
            let Some(value) = el.attr(&test.name) else {
                return false;
            };
            match &test.op {
                AttrOp::Exists => true,
                AttrOp::Equals(v) => value == v,
                AttrOp::Prefix(v) => value.starts_with(v.as_str()),
                AttrOp::Suffix(v) => value.ends_with(v.as_str()),
                AttrOp::Contains(v) => value.contains(v.as_str()),
            }
        })
    }
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    // Each entry is a chain of compounds joined by descendant combinators.
    entries: Vec<Vec<Compound>>,
}

impl SelectorList {
    /// Parse a selector list.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        Parser {
            chars: input.char_indices().collect(),
            pos: 0,
        }
        .list()
    }

    /// Whether `el` matches any entry of the list.
    pub fn matches<E: ElementView>(&self, el: &E) -> bool {
        self.entries.iter().any(|chain| matches_chain(chain, el))
    }
}

fn matches_chain<E: ElementView>(chain: &[Compound], el: &E) -> bool {
    let Some((last, ancestors)) = chain.split_last() else {
        return false;
    };
    if !last.matches(el) {
        return false;
    }
    let mut cursor = el.parent();
    for compound in ancestors.iter().rev() {
        loop {
            let Some(candidate) = cursor else {
                return false;
            };
            cursor = candidate.parent();
            if compound.matches(&candidate) {
                break;
            }
        }
    }
    true
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn unexpected(&self) -> SelectorError {
        match self.chars.get(self.pos) {
            Some(&(at, found)) => SelectorError::Unexpected { at, found },
            None => SelectorError::Unterminated,
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        while let Some(c) = self.peek().filter(|&c| is_ident_char(c)) {
            out.push(c);
            self.pos += 1;
        }
        if out.is_empty() {
            return Err(self.unexpected());
        }
        Ok(out)
    }

    fn list(mut self) -> Result<SelectorList, SelectorError> {
        let mut entries = Vec::new();
        loop {
            self.skip_ws();
            let chain = self.chain()?;
            if chain.is_empty() {
                return Err(SelectorError::Empty);
            }
            entries.push(chain);
            match self.bump() {
                None => break,
                Some(',') => continue,
                Some(_) => {
                    self.pos -= 1;
                    return Err(self.unexpected());
                }
            }
        }
        Ok(SelectorList { entries })
    }

    fn chain(&mut self) -> Result<Vec<Compound>, SelectorError> {
        let mut chain = Vec::new();
        loop {
            let compound = self.compound()?;
            if compound.is_empty() {
                break;
            }
            chain.push(compound);
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some(_) if had_ws => continue,
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(chain)
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                compound.universal = true;
            }
            Some(c) if is_ident_char(c) => compound.tag = Some(self.ident()?.to_ascii_lowercase()),
            _ => {}
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
                    compound.attrs.push(self.attr_test()?);
                }
                _ => break,
            }
        }
        Ok(compound)
    }

    fn attr_test(&mut self) -> Result<AttrTest, SelectorError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let op = match self.bump().ok_or(SelectorError::Unterminated)? {
            ']' => {
                return Ok(AttrTest {
                    name,
                    op: AttrOp::Exists,
                });
            }
            '=' => AttrOp::Equals,
            c @ ('^' | '$' | '*') => {
                if self.bump() != Some('=') {
                    self.pos -= 1;
                    return Err(self.unexpected());
                }
                match c {
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Contains,
                }
            }
            _ => {
                self.pos -= 1;
                return Err(self.unexpected());
            }
        };
        self.skip_ws();
        let value = self.value()?;
        self.skip_ws();
        if self.bump().ok_or(SelectorError::Unterminated)? != ']' {
            self.pos -= 1;
            return Err(self.unexpected());
        }
        Ok(AttrTest {
            name,
            op: op(value),
        })
    }

    fn value(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut out = String::new();
                loop {
                    match self.bump() {
                        None => return Err(SelectorError::Unterminated),
                        Some(c) if c == quote => return Ok(out),
                        Some(c) => out.push(c),
                    }
                }
            }
            _ => self.ident(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat fixture: index 0 is the root, `parent` links by index.
    struct Fixture {
        nodes: Vec<(&'static str, Vec<(&'static str, &'static str)>, Option<usize>)>,
    }

    #[derive(Clone, Copy)]
    struct View<'a> {
        fixture: &'a Fixture,
        idx: usize,
    }

    impl ElementView for View<'_> {
        fn tag(&self) -> &str {
            self.fixture.nodes[self.idx].0
        }

        fn attr(&self, name: &str) -> Option<&str> {
            self.fixture.nodes[self.idx]
                .1
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| *v)
        }

        fn parent(&self) -> Option<Self> {
            self.fixture.nodes[self.idx].2.map(|idx| View {
                fixture: self.fixture,
                idx,
            })
        }
    }

    fn fixture() -> Fixture {
        Fixture {
            nodes: vec![
                ("body", vec![], None),
                ("nav", vec![("class", "navbar main"), ("id", "top")], Some(0)),
                ("ul", vec![("class", "nav-menu")], Some(1)),
                ("a", vec![("class", "nav-link"), ("href", "#about")], Some(2)),
                ("img", vec![("data-src", "hero.webp")], Some(0)),
            ],
        }
    }

    fn matches(sel: &str, idx: usize) -> bool {
        let f = fixture();
        SelectorList::parse(sel)
            .unwrap()
            .matches(&View { fixture: &f, idx })
    }

    #[test]
    fn simple_compounds() {
        assert!(matches("nav", 1));
        assert!(matches("#top", 1));
        assert!(matches(".navbar.main", 1));
        assert!(matches("nav.navbar#top", 1));
        assert!(!matches(".navbar.other", 1));
        assert!(matches("*", 4));
    }

    #[test]
    fn attribute_operators() {
        assert!(matches("img[data-src]", 4));
        assert!(matches("a[href^=\"#\"]", 3));
        assert!(matches("a[href$='about']", 3));
        assert!(matches("a[href*=bou]", 3));
        assert!(matches("a[href=\"#about\"]", 3));
        assert!(!matches("a[href=\"#contact\"]", 3));
        assert!(!matches("img[src]", 4));
    }

    #[test]
    fn descendant_combinator_skips_levels() {
        assert!(matches(".navbar a", 3));
        assert!(matches("body .nav-menu .nav-link", 3));
        assert!(!matches(".nav-menu nav", 1));
        assert!(!matches("ul img", 4));
    }

    #[test]
    fn lists_match_any_entry() {
        assert!(matches("button, a[href], input", 3));
        assert!(!matches("button, input", 3));
    }

    #[test]
    fn tag_match_is_case_insensitive() {
        assert!(matches("NAV", 1));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(SelectorList::parse(""), Err(SelectorError::Empty));
        assert_eq!(SelectorList::parse("a,"), Err(SelectorError::Empty));
        assert_eq!(SelectorList::parse("[href"), Err(SelectorError::Unterminated));
        assert!(matches!(
            SelectorList::parse("a > b"),
            Err(SelectorError::Unexpected { found: '>', .. })
        ));
        assert_eq!(
            SelectorList::parse("[href='x"),
            Err(SelectorError::Unterminated)
        );
    }
}
