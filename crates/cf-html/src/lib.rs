//! Content filter HTML
//!
//! HTML5 parsing built on html5ever, producing a [`cf_dom::Document`], and
//! the matching serializer. Whitespace-only text and comments survive
//! parsing because the filter engine reasons about them.

mod parser;
mod serializer;

pub use cf_dom::{Document, NodeId};
pub use parser::HtmlParser;
pub use serializer::HtmlSerializer;

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Result<Document, ParseError> {
    HtmlParser::new().parse(html)
}

/// Serialize the children of a node
pub fn inner_html(doc: &Document, node: NodeId) -> String {
    HtmlSerializer::new().serialize_inner(doc.tree(), node)
}

/// Serialize a node including its own tags
pub fn outer_html(doc: &Document, node: NodeId) -> String {
    HtmlSerializer::new().serialize_outer(doc.tree(), node)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("could not build the DOM tree: {0}")]
    Tree(#[from] cf_dom::DomError),

    #[error("fragment target {0} is not an element")]
    InvalidTarget(NodeId),
}
