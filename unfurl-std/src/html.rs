//! Building a [`Document`] from HTML source.

use html5ever::{parse_document, tendril::TendrilSink};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use thiserror::Error;
use unfurl_core::{Document, Element};

/// HTML could not be read.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The source could not be read.
    #[error("failed to read html: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse an HTML document.
///
/// Only elements and their attributes are kept; text, comments and
/// doctypes are dropped. The usual `html`/`head`/`body` skeleton is
/// synthesized when missing, so [`Document::body`] is always present.
pub fn parse_html(html: &str) -> Result<Document, ParseError> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())?;
    let document = Document::new();
    import_children(&dom.document, &document.root());
    Ok(document)
}

fn import_children(source: &Handle, target: &Element) {
    for child in source.children.borrow().iter() {
        if let NodeData::Element { name, attrs, .. } = &child.data {
            let attributes: Vec<(String, String)> = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            let element = target.append_child(&name.local, attributes);
            import_children(child, &element);
        }
    }
}
