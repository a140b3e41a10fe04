//! Owned XML tree for Posterous response documents.
//!
//! Success responses are handed back whole; callers walk the tree to pull
//! out sites, posts or tags. The tree owns its strings so it can outlive the
//! response body.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A single XML element with its attributes, child elements and text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First child element called `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Concatenated text directly inside this element. Leading and trailing
    /// whitespace is trimmed once the element closes; whitespace between
    /// text runs around child elements is kept.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text of the first child called `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Element::text)
    }
}

/// A parsed response document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Parse `raw` into a tree. Fails on anything that is not a single
    /// well-formed root element.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut reader = Reader::from_str(raw);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| format!("at byte {}: {e}", reader.error_position()))?;
            match event {
                Event::Start(start) => {
                    if root.is_some() {
                        return Err("content after root element".to_string());
                    }
                    stack.push(open(&start)?);
                }
                Event::Empty(start) => {
                    if root.is_some() {
                        return Err("content after root element".to_string());
                    }
                    let element = open(&start)?;
                    close(element, &mut stack, &mut root);
                }
                Event::End(_) => match stack.pop() {
                    Some(element) => close(element, &mut stack, &mut root),
                    None => return Err("unexpected closing tag".to_string()),
                },
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| e.to_string())?;
                    push_text(&mut stack, &text)?;
                }
                Event::CData(data) => {
                    let data = data.into_inner();
                    let text = std::str::from_utf8(&data).map_err(|e| e.to_string())?;
                    push_text(&mut stack, text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err("unexpected end of document".to_string());
        }
        root.map(|root| Document { root })
            .ok_or_else(|| "document has no root element".to_string())
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }
}

fn open(start: &BytesStart<'_>) -> Result<Element, String> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| e.to_string())?
        .to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| e.to_string())?
            .to_string();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        ..Element::default()
    })
}

fn close(mut element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    let trimmed = element.text.trim();
    if trimmed.len() != element.text.len() {
        element.text = trimmed.to_string();
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), String> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err("text outside root element".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_attributes() {
        let doc = Document::parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <rsp stat="ok">
              <site><id>1</id><name>Demo &amp; Co</name><private>false</private></site>
              <site><id>2</id><name>Other</name></site>
            </rsp>"#,
        )
        .unwrap();
        let root = doc.root();
        assert_eq!(root.name(), "rsp");
        assert_eq!(root.attr("stat"), Some("ok"));
        let sites: Vec<_> = root.children_named("site").collect();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].child_text("name"), Some("Demo & Co"));
        assert_eq!(sites[1].child_text("id"), Some("2"));
        assert_eq!(sites[1].child("private"), None);
    }

    #[test]
    fn mixed_content_keeps_inner_whitespace() {
        let doc = Document::parse("<a>  x <b/> y\n</a>").unwrap();
        assert_eq!(doc.root().text(), "x  y");
        assert_eq!(doc.root().children().len(), 1);
        assert_eq!(doc.root().children()[0].text(), "");
    }

    #[test]
    fn keeps_cdata_as_text() {
        let doc = Document::parse("<rsp stat=\"ok\"><body><![CDATA[<b>hi</b>]]></body></rsp>").unwrap();
        assert_eq!(doc.root().child_text("body"), Some("<b>hi</b>"));
    }

    #[test]
    fn unescapes_attribute_values() {
        let doc = Document::parse(r#"<err code="1" msg="a &lt; b"/>"#).unwrap();
        assert_eq!(doc.root().attr("msg"), Some("a < b"));
        assert!(doc.root().children().is_empty());
    }

    #[test]
    fn rejects_unclosed_root() {
        assert!(Document::parse("<rsp stat=\"ok\"><site>").is_err());
    }

    #[test]
    fn rejects_mismatched_tags() {
        assert!(Document::parse("<rsp><a></b></rsp>").is_err());
    }

    #[test]
    fn rejects_empty_and_plain_text() {
        assert!(Document::parse("").is_err());
        assert!(Document::parse("Service Unavailable").is_err());
    }

    #[test]
    fn rejects_second_root() {
        assert!(Document::parse("<a/><b/>").is_err());
    }
}
