//! A small XML reader for Anafora/THYME-ML annotation files.
//!
//! Only the subset of XML those files use is supported: elements, attributes,
//! character data with the predefined and numeric entities, CDATA sections,
//! comments, processing instructions and a DOCTYPE line. Namespaces and DTD
//! internals are not interpreted.

use std::cell::Cell;
use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::errors::{FormatError, FormatResult};

static PREDEFINED_ENTITIES: Lazy<HashMap<&'static str, char>> = Lazy::new(|| {
    let mut entities = HashMap::new();
    entities.insert("amp", '&');
    entities.insert("lt", '<');
    entities.insert("gt", '>');
    entities.insert("quot", '"');
    entities.insert("apos", '\'');
    entities
});

/// A parsed XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated character data directly inside this element.
    pub text: String,
    /// 1-based line of the opening tag.
    pub line: usize,
}

impl Element {
    /// First child element with the given tag.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Trimmed text of the first child with the given tag, if non-empty.
    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.child(tag)
            .map(|child| child.text.trim())
            .filter(|text| !text.is_empty())
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.tag == tag)
    }
}

/// Parse a complete XML document and return its root element.
pub fn parse_document(input: &str) -> FormatResult<Element> {
    let mut reader = Reader {
        input,
        pos: 0,
        line_mark: Cell::new((0, 1)),
    };
    reader.skip_misc()?;
    if !reader.rest().starts_with('<') {
        return Err(reader.error("expected root element"));
    }
    let root = reader.parse_element()?;
    reader.skip_misc()?;
    if !reader.rest().is_empty() {
        return Err(reader.error("content after root element"));
    }
    Ok(root)
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
    /// Last `(pos, line)` a line number was computed for. `pos` only moves
    /// forward, so each lookup counts newlines from the previous mark.
    line_mark: Cell<(usize, usize)>,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn line(&self) -> usize {
        let (mark, line) = self.line_mark.get();
        let line = if self.pos >= mark {
            line + count_newlines(&self.input[mark..self.pos])
        } else {
            1 + count_newlines(&self.input[..self.pos])
        };
        self.line_mark.set((self.pos, line));
        line
    }

    fn error(&self, message: impl Into<String>) -> FormatError {
        FormatError::Xml {
            line: self.line(),
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Advance past `terminator`, failing with `what` if it never appears.
    fn skip_past(&mut self, terminator: &str, what: &str) -> FormatResult<&'a str> {
        let rest = self.rest();
        match rest.find(terminator) {
            Some(idx) => {
                self.pos += idx + terminator.len();
                Ok(&rest[..idx])
            }
            None => Err(self.error(format!("unterminated {}", what))),
        }
    }

    /// Skip whitespace, comments, processing instructions and DOCTYPE.
    fn skip_misc(&mut self) -> FormatResult<()> {
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else if rest.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
            } else if rest.starts_with("<!DOCTYPE") {
                self.skip_past(">", "DOCTYPE")?;
            } else {
                return Ok(());
            }
        }
    }

    fn read_name(&mut self) -> FormatResult<String> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>' || c == '=')
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        self.pos += len;
        Ok(rest[..len].to_string())
    }

    fn parse_element(&mut self) -> FormatResult<Element> {
        let line = self.line();
        self.pos += 1; // '<'
        let tag = self.read_name()?;
        let mut attributes = Vec::new();

        // Attributes, then either `/>` or `>`.
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok(Element {
                    tag,
                    attributes,
                    children: Vec::new(),
                    text: String::new(),
                    line,
                });
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.is_empty() {
                return Err(self.error(format!("unclosed tag <{}>", tag)));
            }

            let name = self.read_name()?;
            self.skip_whitespace();
            if !self.rest().starts_with('=') {
                return Err(self.error(format!("expected '=' after attribute {}", name)));
            }
            self.pos += 1;
            self.skip_whitespace();
            let quote = match self.rest().chars().next() {
                Some(q @ ('"' | '\'')) => q,
                _ => return Err(self.error(format!("expected quoted value for {}", name))),
            };
            self.pos += 1;
            let raw = self.skip_past(&quote.to_string(), "attribute value")?;
            attributes.push((name, decode_entities(raw, line)?));
        }

        let mut children = Vec::new();
        let mut text = String::new();

        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(format!("unclosed element <{}>", tag)));
            }
            if rest.starts_with("</") {
                self.pos += 2;
                let closing = self.read_name()?;
                if closing != tag {
                    return Err(self.error(format!(
                        "mismatched closing tag </{}>, expected </{}>",
                        closing, tag
                    )));
                }
                self.skip_whitespace();
                if !self.rest().starts_with('>') {
                    return Err(self.error(format!("malformed closing tag </{}>", tag)));
                }
                self.pos += 1;
                break;
            } else if rest.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
            } else if rest.starts_with("<![CDATA[") {
                self.pos += "<![CDATA[".len();
                let raw = self.skip_past("]]>", "CDATA section")?;
                text.push_str(raw);
            } else if rest.starts_with("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else if rest.starts_with('<') {
                children.push(self.parse_element()?);
            } else {
                let len = rest.find('<').unwrap_or(rest.len());
                let line = self.line();
                text.push_str(&decode_entities(&rest[..len], line)?);
                self.pos += len;
            }
        }

        Ok(Element {
            tag,
            attributes,
            children,
            text,
            line,
        })
    }
}

/// Replace `&name;`, `&#NN;` and `&#xNN;` references with their characters.
fn decode_entities(raw: &str, line: usize) -> FormatResult<String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after.find(';').ok_or_else(|| FormatError::Xml {
            line,
            message: "unterminated entity reference".to_string(),
        })?;
        let name = &after[..semi];

        let ch = if let Some(hex) = name.strip_prefix("#x") {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = name.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            PREDEFINED_ENTITIES.get(name).copied()
        };

        match ch {
            Some(ch) => decoded.push(ch),
            None => {
                return Err(FormatError::Xml {
                    line,
                    message: format!("unknown entity &{};", name),
                })
            }
        }
        rest = &after[semi + 1..];
    }
    decoded.push_str(rest);
    Ok(decoded)
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let root = parse_document(
            "<?xml version='1.0' encoding='UTF-8'?>\n<data><a>one</a><b><c>two</c></b></data>",
        )
        .unwrap();
        assert_eq!(root.tag, "data");
        assert_eq!(root.child_text("a"), Some("one"));
        assert_eq!(root.child("b").unwrap().child_text("c"), Some("two"));
    }

    #[test]
    fn test_parse_attributes_and_self_closing() {
        let root = parse_document(r#"<data version="2"><schema path="./" protocol='file'/></data>"#)
            .unwrap();
        assert_eq!(root.attributes, vec![("version".to_string(), "2".to_string())]);
        let schema = root.child("schema").unwrap();
        assert_eq!(schema.attributes.len(), 2);
        assert!(schema.children.is_empty());
    }

    #[test]
    fn test_decode_entities() {
        let root = parse_document("<t>a &lt; b &amp;&amp; c &#65;&#x42;</t>").unwrap();
        assert_eq!(root.text, "a < b && c AB");
    }

    #[test]
    fn test_comments_and_cdata() {
        let root = parse_document("<!-- header --><t><!-- x -->v<![CDATA[<raw>]]></t>").unwrap();
        assert_eq!(root.text, "v<raw>");
    }

    #[test]
    fn test_children_named() {
        let root = parse_document("<p><s>1</s><t>x</t><s>2</s></p>").unwrap();
        let values: Vec<&str> = root.children_named("s").map(|e| e.text.as_str()).collect();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[test]
    fn test_mismatched_tag_reports_line() {
        let err = parse_document("<data>\n<a>\n</b>\n</data>").unwrap_err();
        match err {
            FormatError::Xml { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("mismatched"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_element_lines_follow_the_input() {
        let root = parse_document(
            "<data>\n<!-- two\nlines -->\n<a>x\ny</a>\n<b/>\n\n<c><d/>\n</c>\n</data>",
        )
        .unwrap();
        let lines: Vec<(&str, usize)> = root
            .children
            .iter()
            .map(|child| (child.tag.as_str(), child.line))
            .collect();
        assert_eq!(lines, vec![("a", 4), ("b", 6), ("c", 8)]);
        assert_eq!(root.child("c").unwrap().child("d").unwrap().line, 8);
    }

    #[test]
    fn test_many_elements_keep_line_numbers() {
        let mut xml = String::from("<data>\n");
        for i in 0..20_000 {
            xml.push_str(&format!("<entity><id>{}</id>\n<span>1,2</span></entity>\n", i));
        }
        xml.push_str("</oops>\n");
        match parse_document(&xml).unwrap_err() {
            FormatError::Xml { line, .. } => assert_eq!(line, 40_002),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_element() {
        assert!(parse_document("<data><a>text</a>").is_err());
    }

    #[test]
    fn test_unknown_entity() {
        assert!(parse_document("<t>&nbsp;</t>").is_err());
    }

    #[test]
    fn test_trailing_content_rejected() {
        assert!(parse_document("<a/><b/>").is_err());
    }
}
