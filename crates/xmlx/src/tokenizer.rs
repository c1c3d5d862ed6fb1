//! XML tokenizer
//!
//! Turns UTF-8 input into a flat sequence of [`Token`]s. Namespace prefixes are
//! translated to their bound URI using the declarations of the currently open
//! elements; the tree builder later maps those URIs to aliases.

use std::collections::HashMap;

use crate::cursor::Cursor;
use crate::error::{Error, Pos, Result};
use crate::name::{Attribute, QualifiedName};
use crate::token::Token;

const XMLNS: &str = "xmlns";
const CDATA_START: &[u8] = b"<![CDATA[";

/// Prefix bindings declared by one open element
#[derive(Debug)]
struct Scope {
    raw_name: String,
    bindings: Vec<(String, String)>,
}

/// Streaming XML tokenizer
#[derive(Debug)]
pub struct Tokenizer<'a> {
    cursor: Cursor<'a>,
    entities: &'a HashMap<String, String>,
    scopes: Vec<Scope>,
    /// End token owed for a `<name/>` element
    pending_end: Option<QualifiedName>,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer that expands custom entities from `entities`
    pub fn new(input: &'a [u8], entities: &'a HashMap<String, String>) -> Self {
        Self {
            cursor: Cursor::new(input),
            entities,
            scopes: Vec::new(),
            pending_end: None,
        }
    }

    /// Number of elements opened and not yet closed
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Current position in the input
    pub const fn position(&self) -> Pos {
        self.cursor.position()
    }

    /// Get the next token, or `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(name) = self.pending_end.take() {
            self.scopes.pop();
            return Ok(Some(Token::EndElement { name }));
        }

        loop {
            match self.cursor.current() {
                None => return Ok(None),
                Some(b'<') if !self.cursor.starts_with(CDATA_START) => {
                    return self.parse_markup().map(Some)
                }
                Some(_) => {
                    // a run of empty CDATA sections yields nothing
                    let text = self.parse_char_data()?;
                    if !text.is_empty() {
                        return Ok(Some(Token::CharData(text)));
                    }
                }
            }
        }
    }

    fn parse_markup(&mut self) -> Result<Token> {
        if self.cursor.starts_with(b"</") {
            self.cursor.advance_by(2);
            return self.parse_end_tag();
        }
        if self.cursor.starts_with(b"<?") {
            self.cursor.advance_by(2);
            return self.parse_proc_inst();
        }
        if self.cursor.starts_with(b"<!--") {
            self.cursor.advance_by(4);
            return self.parse_comment();
        }
        if self.cursor.starts_with(b"<!") {
            self.cursor.advance_by(2);
            return self.parse_directive();
        }
        self.cursor.advance();
        self.parse_start_tag()
    }

    fn parse_start_tag(&mut self) -> Result<Token> {
        let raw_name = self.parse_name()?;
        let mut raw_attributes = Vec::new();

        let self_closing = loop {
            self.cursor.skip_whitespace();
            if self.cursor.consume_bytes(b"/>") {
                break true;
            }
            if self.cursor.consume(b'>') {
                break false;
            }
            if self.cursor.is_eof() {
                return Err(self.error_here("unexpected EOF"));
            }

            let attr_name = self.parse_name()?;
            self.cursor.skip_whitespace();
            if !self.cursor.consume(b'=') {
                return Err(self.error_here(format!(
                    "attribute name without = in element <{raw_name}>"
                )));
            }
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value(&raw_name)?;
            raw_attributes.push((attr_name, value));
        };

        let bindings = raw_attributes
            .iter()
            .filter_map(|(name, value)| {
                if name == XMLNS {
                    Some((String::new(), value.clone()))
                } else {
                    name.strip_prefix("xmlns:")
                        .map(|prefix| (prefix.to_string(), value.clone()))
                }
            })
            .collect();
        self.scopes.push(Scope {
            raw_name: raw_name.clone(),
            bindings,
        });

        let name = self.translate(QualifiedName::parse(&raw_name), true);
        let attributes = raw_attributes
            .into_iter()
            .map(|(raw, value)| {
                Attribute::new(self.translate(QualifiedName::parse(&raw), false), value)
            })
            .collect();

        if self_closing {
            self.pending_end = Some(name.clone());
        }
        Ok(Token::StartElement { name, attributes })
    }

    fn parse_end_tag(&mut self) -> Result<Token> {
        let raw_name = self.parse_name()?;
        self.cursor.skip_whitespace();
        if !self.cursor.consume(b'>') {
            return Err(self.error_here(format!("invalid characters between </{raw_name} and >")));
        }

        let Some(open) = self.scopes.last() else {
            // no open element: the builder decides what a stray end tag means
            return Ok(Token::EndElement {
                name: QualifiedName::parse(&raw_name),
            });
        };
        if open.raw_name != raw_name {
            return Err(self.error_here(format!(
                "element <{}> closed by </{raw_name}>",
                open.raw_name
            )));
        }

        let name = self.translate(QualifiedName::parse(&raw_name), true);
        self.scopes.pop();
        Ok(Token::EndElement { name })
    }

    fn parse_proc_inst(&mut self) -> Result<Token> {
        let target = self.parse_name()?;
        if self.cursor.consume_bytes(b"?>") {
            return Ok(Token::ProcInst {
                target,
                content: String::new(),
            });
        }
        if !self.cursor.current().is_some_and(|b| b.is_ascii_whitespace()) {
            return Err(self.error_here(format!("expected space after <?{target}")));
        }
        self.cursor.skip_whitespace();
        let start_pos = self.cursor.position();
        let raw = self.take_until(b"?>")?;
        let content = to_str(raw, start_pos)?.to_string();
        Ok(Token::ProcInst { target, content })
    }

    fn parse_comment(&mut self) -> Result<Token> {
        let start_pos = self.cursor.position();
        let raw = self.take_until(b"--")?;
        if !self.cursor.consume(b'>') {
            return Err(self.error_here("invalid sequence \"--\" not allowed in comments"));
        }
        Ok(Token::Comment(to_str(raw, start_pos)?.to_string()))
    }

    /// Text and CDATA sections up to the next markup, joined into one value
    fn parse_char_data(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            if self.cursor.consume_bytes(CDATA_START) {
                text.push_str(&self.parse_cdata()?);
                continue;
            }
            match self.cursor.current() {
                None | Some(b'<') => return Ok(text),
                Some(_) => text.push_str(&self.parse_text()?),
            }
        }
    }

    fn parse_cdata(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let raw = self.take_until(b"]]>")?;
        Ok(normalize_newlines(to_str(raw, start_pos)?))
    }

    /// `<!DOCTYPE ...>` and friends. Brackets and quotes are balanced so an
    /// internal subset stays in one directive; comments inside it are dropped.
    fn parse_directive(&mut self) -> Result<Token> {
        let start_pos = self.cursor.position();
        let mut content = Vec::new();
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;

        loop {
            let Some(b) = self.cursor.current() else {
                return Err(self.error_here("unexpected EOF"));
            };
            if quote.is_none() && self.cursor.consume_bytes(b"<!--") {
                self.take_until(b"-->")?;
                continue;
            }
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'<') => depth += 1,
                (None, b'>') if depth == 0 => break,
                (None, b'>') => depth -= 1,
                (None, _) => {}
            }
            content.push(b);
            self.cursor.advance();
        }

        self.cursor.advance();
        Ok(Token::Directive(to_str(&content, start_pos)?.to_string()))
    }

    fn parse_text(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }
        let raw = to_str(self.cursor.slice_from(start), start_pos)?;
        self.expand(raw, start_pos)
    }

    fn parse_attribute_value(&mut self, element: &str) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(self.error_here(format!(
                    "unquoted or missing attribute value in element <{element}>"
                )))
            }
        };
        self.cursor.advance();

        let start_pos = self.cursor.position();
        let start = self.cursor.pos();
        loop {
            match self.cursor.current() {
                None => return Err(self.error_here("unexpected EOF")),
                Some(b'<') => return Err(self.error_here("unescaped < inside quoted string")),
                Some(b) if b == quote => break,
                Some(_) => self.cursor.advance(),
            }
        }
        let raw = to_str(self.cursor.slice_from(start), start_pos)?;
        self.cursor.advance();
        self.expand(raw, start_pos)
    }

    fn parse_name(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(b) if is_name_start(b) => self.cursor.advance(),
            Some(b) => {
                return Err(Error::syntax(
                    format!("invalid XML name: {:?}", char::from(b)),
                    start_pos,
                ))
            }
            None => return Err(Error::syntax("unexpected EOF", start_pos)),
        }
        while self.cursor.current().is_some_and(is_name_char) {
            self.cursor.advance();
        }

        Ok(to_str(self.cursor.slice_from(start), start_pos)?.to_string())
    }

    /// Consume through `pattern`, returning the bytes before it
    fn take_until(&mut self, pattern: &[u8]) -> Result<&'a [u8]> {
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance_by(pattern.len());
                return Ok(raw);
            }
            self.cursor.advance();
        }
        Err(self.error_here("unexpected EOF"))
    }

    /// Replace a bound prefix with its namespace URI.
    ///
    /// Unprefixed attributes and `xmlns` declarations are never translated;
    /// unprefixed elements take the default namespace when one is in scope.
    fn translate(&self, mut name: QualifiedName, is_element: bool) -> QualifiedName {
        if name.space == XMLNS
            || name.space == "xml"
            || (name.space.is_empty() && (!is_element || name.local == XMLNS))
        {
            return name;
        }
        if let Some(uri) = self.lookup(&name.space) {
            name.space = uri.to_string();
        }
        name
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.scopes.iter().rev().find_map(|scope| {
            scope
                .bindings
                .iter()
                .rev()
                .find(|(p, _)| p == prefix)
                .map(|(_, uri)| uri.as_str())
        })
    }

    /// Expand entity and character references, normalizing line ends
    fn expand(&self, raw: &str, pos: Pos) -> Result<String> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;

        while let Some(i) = rest.find(['&', '\r']) {
            out.push_str(&rest[..i]);
            let tail = &rest[i..];
            if let Some(after) = tail.strip_prefix('\r') {
                out.push('\n');
                rest = after.strip_prefix('\n').unwrap_or(after);
                continue;
            }

            let Some(end) = tail.find(';') else {
                return Err(Error::syntax(
                    format!("invalid character entity {tail} (no semicolon)"),
                    pos,
                ));
            };
            let entity = &tail[1..end];
            match self.resolve_entity(entity) {
                Some(text) => out.push_str(&text),
                None => {
                    return Err(Error::syntax(
                        format!("invalid character entity &{entity};"),
                        pos,
                    ))
                }
            }
            rest = &tail[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn resolve_entity(&self, entity: &str) -> Option<String> {
        let predefined = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "apos" => Some('\''),
            "quot" => Some('"'),
            _ => decode_char_ref(entity),
        };
        predefined
            .map(String::from)
            .or_else(|| self.entities.get(entity).cloned())
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        Error::syntax(message, self.cursor.position())
    }
}

fn to_str(bytes: &[u8], pos: Pos) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| Error::syntax("invalid UTF-8", pos))
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn decode_char_ref(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code)
}

// Bytes >= 0x80 belong to multi-byte UTF-8 name characters; the slice is
// validated when converted to a string.
fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Result<Vec<Token>> {
        let entities = HashMap::new();
        tokens_with(input, &entities)
    }

    fn tokens_with(input: &str, entities: &HashMap<String, String>) -> Result<Vec<Token>> {
        let mut tokenizer = Tokenizer::new(input.as_bytes(), entities);
        let mut out = Vec::new();
        while let Some(token) = tokenizer.next_token()? {
            out.push(token);
        }
        Ok(out)
    }

    fn start(space: &str, local: &str) -> Token {
        Token::StartElement {
            name: QualifiedName::new(space, local),
            attributes: Vec::new(),
        }
    }

    fn end(space: &str, local: &str) -> Token {
        Token::EndElement {
            name: QualifiedName::new(space, local),
        }
    }

    #[test]
    fn test_simple_element() -> Result<()> {
        let toks = tokens("<root>hi</root>")?;
        assert_eq!(
            toks,
            vec![
                start("", "root"),
                Token::CharData("hi".to_string()),
                end("", "root")
            ]
        );
        Ok(())
    }

    #[test]
    fn test_self_closing_emits_end() -> Result<()> {
        let toks = tokens("<a><b /></a>")?;
        assert_eq!(
            toks,
            vec![start("", "a"), start("", "b"), end("", "b"), end("", "a")]
        );
        Ok(())
    }

    #[test]
    fn test_attributes_in_order_with_duplicates() -> Result<()> {
        let toks = tokens(r#"<a x="1" y='2' x="3"/>"#)?;
        let Some(Token::StartElement { attributes, .. }) = toks.first() else {
            return Err(Error::syntax("expected start element", Pos::default()));
        };
        let pairs: Vec<_> = attributes
            .iter()
            .map(|a| (a.name.local.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("x", "1"), ("y", "2"), ("x", "3")]);
        Ok(())
    }

    #[test]
    fn test_default_namespace_translation() -> Result<()> {
        let toks = tokens(r#"<root xmlns="urn:a"><child/></root>"#)?;
        let Some(Token::StartElement { name, attributes }) = toks.first() else {
            return Err(Error::syntax("expected start element", Pos::default()));
        };
        assert_eq!(name, &QualifiedName::new("urn:a", "root"));
        assert_eq!(attributes[0].name, QualifiedName::local("xmlns"));
        assert_eq!(toks[1], start("urn:a", "child"));
        Ok(())
    }

    #[test]
    fn test_prefixed_namespace_translation() -> Result<()> {
        let toks = tokens(r#"<p:a xmlns:p="urn:p" p:k="v" k="w"/>"#)?;
        let Some(Token::StartElement { name, attributes }) = toks.first() else {
            return Err(Error::syntax("expected start element", Pos::default()));
        };
        assert_eq!(name, &QualifiedName::new("urn:p", "a"));
        assert_eq!(attributes[0].name, QualifiedName::new("xmlns", "p"));
        assert_eq!(attributes[1].name, QualifiedName::new("urn:p", "k"));
        assert_eq!(attributes[2].name, QualifiedName::local("k"));
        Ok(())
    }

    #[test]
    fn test_namespace_scope_ends_with_element() -> Result<()> {
        let toks = tokens(r#"<r><a xmlns:p="urn:p"/><p:b/></r>"#)?;
        assert_eq!(toks[3], start("p", "b"));
        Ok(())
    }

    #[test]
    fn test_unbound_and_xml_prefix_untouched() -> Result<()> {
        let toks = tokens(r#"<q:a xml:lang="en"/>"#)?;
        let Some(Token::StartElement { name, attributes }) = toks.first() else {
            return Err(Error::syntax("expected start element", Pos::default()));
        };
        assert_eq!(name, &QualifiedName::new("q", "a"));
        assert_eq!(attributes[0].name, QualifiedName::new("xml", "lang"));
        Ok(())
    }

    #[test]
    fn test_entities_expanded() -> Result<()> {
        let mut entities = HashMap::new();
        entities.insert("copy".to_string(), "\u{a9}".to_string());
        let toks = tokens_with(r#"<a t="&quot;&#65;&#x42;">&lt;&amp;&copy;</a>"#, &entities)?;
        let Some(Token::StartElement { attributes, .. }) = toks.first() else {
            return Err(Error::syntax("expected start element", Pos::default()));
        };
        assert_eq!(attributes[0].value, "\"AB");
        assert_eq!(toks[1], Token::CharData("<&\u{a9}".to_string()));
        Ok(())
    }

    #[test]
    fn test_unknown_entity_is_error() {
        let err = tokens("<a>&nbsp;</a>");
        assert!(
            matches!(err, Err(Error::Syntax { ref message, .. }) if message == "invalid character entity &nbsp;")
        );
    }

    #[test]
    fn test_newlines_normalized() -> Result<()> {
        let toks = tokens("<a>x\r\ny\rz&#xD;</a>")?;
        assert_eq!(toks[1], Token::CharData("x\ny\nz\r".to_string()));
        Ok(())
    }

    #[test]
    fn test_comment_pi_directive_cdata() -> Result<()> {
        let toks = tokens(
            "<!DOCTYPE a [<!ENTITY e \"x>\">]><?style k=\"v\"?><a><!-- c --><![CDATA[<raw>]]></a>",
        )?;
        assert_eq!(
            toks[0],
            Token::Directive("DOCTYPE a [<!ENTITY e \"x>\">]".to_string())
        );
        assert_eq!(
            toks[1],
            Token::ProcInst {
                target: "style".to_string(),
                content: "k=\"v\"".to_string()
            }
        );
        assert_eq!(toks[3], Token::Comment(" c ".to_string()));
        assert_eq!(toks[4], Token::CharData("<raw>".to_string()));
        Ok(())
    }

    #[test]
    fn test_text_and_cdata_join_into_one_token() -> Result<()> {
        let toks = tokens("<a>x<![CDATA[y]]>&amp;<![CDATA[]]>z</a>")?;
        assert_eq!(
            toks,
            vec![
                start("", "a"),
                Token::CharData("xy&z".to_string()),
                end("", "a")
            ]
        );
        Ok(())
    }

    #[test]
    fn test_empty_cdata_yields_no_token() -> Result<()> {
        let toks = tokens("<a><![CDATA[]]></a><![CDATA[]]>")?;
        assert_eq!(toks, vec![start("", "a"), end("", "a")]);
        Ok(())
    }

    #[test]
    fn test_comment_inside_directive_is_skipped() -> Result<()> {
        let toks = tokens("<!DOCTYPE a [<!-- don't <stop> -->\n<!ENTITY e 'v'>]><a/>")?;
        assert_eq!(
            toks[0],
            Token::Directive("DOCTYPE a [\n<!ENTITY e 'v'>]".to_string())
        );
        assert_eq!(toks[1], start("", "a"));
        Ok(())
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = tokens("<a></b>");
        assert!(
            matches!(err, Err(Error::Syntax { ref message, .. }) if message == "element <a> closed by </b>")
        );
    }

    #[test]
    fn test_stray_end_tag_passes_through() -> Result<()> {
        let toks = tokens("<a></a></b>")?;
        assert_eq!(toks.last(), Some(&end("", "b")));
        Ok(())
    }

    #[test]
    fn test_unclosed_element_ends_quietly() -> Result<()> {
        let toks = tokens("<a><b>")?;
        assert_eq!(toks.len(), 2);
        Ok(())
    }

    #[test]
    fn test_attribute_errors() {
        assert!(tokens("<a x=1/>").is_err());
        assert!(tokens("<a x/>").is_err());
        assert!(tokens("<a x=\"<\"/>").is_err());
        assert!(tokens("<a x=\"1").is_err());
    }

    #[test]
    fn test_double_dash_in_comment() {
        assert!(tokens("<!-- a -- b -->").is_err());
    }

    #[test]
    fn test_error_position() {
        let err = tokens("<a>\n  <1/></a>");
        assert!(matches!(err, Err(Error::Syntax { pos, .. }) if pos.line == 2 && pos.col == 4));
    }
}
