//! Character-set decoding for non UTF-8 input

use std::borrow::Cow;

use tracing::debug;

use crate::error::{Error, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Converts input in a declared character set to UTF-8.
///
/// Called once per load, with the charset label from the XML declaration and
/// every byte that follows the declaration.
pub trait CharsetReader {
    fn decode(&self, charset: &str, input: &[u8]) -> Result<String>;
}

impl<F> CharsetReader for F
where
    F: Fn(&str, &[u8]) -> Result<String>,
{
    fn decode(&self, charset: &str, input: &[u8]) -> Result<String> {
        self(charset, input)
    }
}

/// [`CharsetReader`] backed by the WHATWG encodings of `encoding_rs`
#[cfg(feature = "encoding")]
#[derive(Clone, Copy, Debug, Default)]
pub struct EncodingRs;

#[cfg(feature = "encoding")]
impl CharsetReader for EncodingRs {
    fn decode(&self, charset: &str, input: &[u8]) -> Result<String> {
        let encoding = encoding_rs::Encoding::for_label(charset.trim().as_bytes())
            .ok_or_else(|| Error::charset(charset, "unsupported encoding label"))?;
        encoding
            .decode_without_bom_handling_and_without_replacement(input)
            .map(Cow::into_owned)
            .ok_or_else(|| Error::charset(charset, "malformed input"))
    }
}

/// Returns true for labels that need no decoding
pub fn is_utf8_label(label: &str) -> bool {
    label.is_empty() || label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8")
}

/// Produce the UTF-8 bytes the tokenizer reads.
///
/// Strips a UTF-8 byte order mark. When the XML declaration names another
/// encoding, the bytes after the declaration are decoded through `charset`.
pub fn prepare_input<'a>(
    input: &'a [u8],
    charset: Option<&dyn CharsetReader>,
) -> Result<Cow<'a, [u8]>> {
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);

    let Some(decl_len) = declaration_len(input) else {
        return Ok(Cow::Borrowed(input));
    };
    let (decl, rest) = input.split_at(decl_len);
    let decl_text = String::from_utf8_lossy(decl);
    let label = pseudo_attribute(&decl_text, "encoding").unwrap_or_default();
    if is_utf8_label(label) {
        return Ok(Cow::Borrowed(input));
    }

    let Some(reader) = charset else {
        return Err(Error::charset(label, "declared but no charset reader given"));
    };
    debug!(charset = label, bytes = rest.len(), "decoding input");
    let decoded = reader.decode(label, rest)?;

    let mut out = Vec::with_capacity(decl.len() + decoded.len());
    out.extend_from_slice(decl);
    out.extend_from_slice(decoded.as_bytes());
    Ok(Cow::Owned(out))
}

/// Length of a leading `<?xml ...?>` declaration, including the `?>`
fn declaration_len(input: &[u8]) -> Option<usize> {
    let after = input.strip_prefix(b"<?xml")?;
    if !after.first().is_some_and(u8::is_ascii_whitespace) {
        return None;
    }
    let end = input.windows(2).position(|w| w == b"?>")?;
    Some(end + 2)
}

/// Value of `key="..."` (or single quoted) inside a declaration
pub fn pseudo_attribute<'a>(decl: &'a str, key: &str) -> Option<&'a str> {
    let mut rest = decl;
    while let Some(i) = rest.find(key) {
        let after = rest.get(i + key.len()..)?.trim_start();
        rest = rest.get(i + key.len()..)?;
        let Some(after) = after.strip_prefix('=') else {
            continue;
        };
        let after = after.trim_start();
        let quote = after.chars().next()?;
        if quote != '"' && quote != '\'' {
            continue;
        }
        let body = after.get(1..)?;
        let end = body.find(quote)?;
        return body.get(..end);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_input_is_borrowed() -> Result<()> {
        let input = b"<a/>";
        let prepared = prepare_input(input, None)?;
        assert!(matches!(prepared, Cow::Borrowed(_)));
        assert_eq!(&*prepared, input);
        Ok(())
    }

    #[test]
    fn test_bom_is_stripped() -> Result<()> {
        let prepared = prepare_input(b"\xEF\xBB\xBF<a/>", None)?;
        assert_eq!(&*prepared, b"<a/>");
        Ok(())
    }

    #[test]
    fn test_utf8_declaration_needs_no_reader() -> Result<()> {
        let input = br#"<?xml version="1.0" encoding="utf-8"?><a/>"#;
        let prepared = prepare_input(input, None)?;
        assert_eq!(&*prepared, input);
        Ok(())
    }

    #[test]
    fn test_foreign_encoding_without_reader_fails() {
        let input = br#"<?xml version="1.0" encoding="ISO-8859-1"?><a/>"#;
        let err = prepare_input(input, None);
        assert!(matches!(err, Err(Error::Charset { ref charset, .. }) if charset == "ISO-8859-1"));
    }

    #[test]
    fn test_closure_reader_is_called() -> Result<()> {
        let reader = |charset: &str, input: &[u8]| -> Result<String> {
            assert_eq!(charset, "x-upper");
            Ok(String::from_utf8_lossy(input).to_uppercase())
        };
        let input = b"<?xml version='1.0' encoding='x-upper'?><a>hi</a>";
        let prepared = prepare_input(input, Some(&reader))?;
        assert_eq!(
            &*prepared,
            b"<?xml version='1.0' encoding='x-upper'?><A>HI</A>".as_slice()
        );
        Ok(())
    }

    #[cfg(feature = "encoding")]
    #[test]
    fn test_encoding_rs_latin1() -> Result<()> {
        let input = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>caf\xE9</a>";
        let prepared = prepare_input(input, Some(&EncodingRs))?;
        assert!(std::str::from_utf8(&prepared).is_ok_and(|s| s.ends_with("<a>café</a>")));
        Ok(())
    }

    #[cfg(feature = "encoding")]
    #[test]
    fn test_encoding_rs_unknown_label() {
        let err = EncodingRs.decode("no-such-charset", b"x");
        assert!(matches!(err, Err(Error::Charset { .. })));
    }

    #[test]
    fn test_pseudo_attribute() {
        let decl = r#"<?xml version="1.0" encoding = 'latin1' standalone="no"?>"#;
        assert_eq!(pseudo_attribute(decl, "version"), Some("1.0"));
        assert_eq!(pseudo_attribute(decl, "encoding"), Some("latin1"));
        assert_eq!(pseudo_attribute(decl, "standalone"), Some("no"));
        assert_eq!(pseudo_attribute(decl, "missing"), None);
    }
}
