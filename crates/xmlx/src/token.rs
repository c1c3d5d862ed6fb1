//! XML tokens produced by the tokenizer

use crate::name::{Attribute, QualifiedName};

/// Tokens emitted by [`Tokenizer`](crate::tokenizer::Tokenizer)
///
/// Element and attribute names carry the namespace URI in `space` when their
/// prefix is bound, otherwise the raw prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// `<name attr="v">`, also emitted for `<name/>`
    StartElement {
        name: QualifiedName,
        attributes: Vec<Attribute>,
    },
    /// `</name>`, also emitted right after the start of `<name/>`
    EndElement { name: QualifiedName },
    /// Character data with entities expanded, including CDATA sections
    CharData(String),
    /// Text between `<!--` and `-->`
    Comment(String),
    /// `<?target content?>`
    ProcInst { target: String, content: String },
    /// Text between `<!` and the matching `>`
    Directive(String),
}

impl Token {
    /// Token name for log and error messages
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StartElement { .. } => "start element",
            Self::EndElement { .. } => "end element",
            Self::CharData(_) => "character data",
            Self::Comment(_) => "comment",
            Self::ProcInst { .. } => "processing instruction",
            Self::Directive(_) => "directive",
        }
    }
}
