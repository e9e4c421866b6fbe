//! USX (Unified Scripture XML) reading and writing on top of `quick-xml`.
use std::io::Cursor;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

use crate::core::element::Element;
use crate::types::Tag;

/// Errors encountered when reading or writing USX
#[derive(Debug, Error)]
pub enum UsxError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Invalid attribute: {0}")]
    Attribute(String),
    #[error("Unexpected closing tag </{0}>")]
    UnexpectedClose(String),
    #[error("Unclosed element <{0}> at end of document")]
    Unclosed(String),
    #[error("Document has no root element")]
    Empty,
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, UsxError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let mut elem = Element::new(Tag::from_name(&name));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| UsxError::Attribute(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value()?.to_string();
        elem.set_attribute(&key, value);
    }
    Ok(elem)
}

/// Parse USX text into an element tree rooted at the document element.
pub fn parse_usx(xml: &str) -> Result<Element, UsxError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => stack.push(element_from_start(e)?),
            Event::Empty(ref e) => {
                let elem = element_from_start(e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(elem),
                    None if root.is_none() => root = Some(elem),
                    None => {}
                }
            }
            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let elem = stack.pop().ok_or_else(|| UsxError::UnexpectedClose(name))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(elem),
                    None if root.is_none() => root = Some(elem),
                    None => {}
                }
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    current.append_text(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    current.append_text(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(UsxError::Unclosed(open.tag.to_string()));
    }
    root.ok_or(UsxError::Empty)
}

fn write_element(writer: &mut Writer<Cursor<Vec<u8>>>, elem: &Element) -> Result<(), UsxError> {
    let name = elem.tag.as_str();
    let mut start = BytesStart::new(name);
    for (key, value) in elem.attribute_pairs() {
        start.push_attribute((key, value));
    }

    if elem.text.is_none() && elem.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
    } else {
        writer.write_event(Event::Start(start))?;
        if let Some(text) = &elem.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &elem.children {
            write_element(writer, child)?;
        }
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }

    if let Some(tail) = &elem.tail {
        writer.write_event(Event::Text(BytesText::new(tail)))?;
    }
    Ok(())
}

/// Serialize an element tree as a USX document.
pub fn to_usx_string(root: &Element) -> Result<String, UsxError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    write_element(&mut writer, root)?;
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<usx version="3.0">
  <book code="GEN" style="id">World English Bible</book>
  <chapter number="1" style="c" sid="GEN 1"/>
  <para style="p"><verse number="1" style="v" sid="GEN 1:1"/>In the beginning, <char style="nd">God</char> created &amp; made.<note caller="+" style="f"><char style="ft">Or, heavens</char></note></para>
</usx>"#;

    #[test]
    fn builds_text_and_tail() {
        let root = parse_usx(SAMPLE).unwrap();
        assert_eq!(root.tag, Tag::Usx);
        assert_eq!(root.attributes, vec![("version".to_string(), "3.0".to_string())]);

        let children: Vec<&Tag> = root.children.iter().map(|c| &c.tag).collect();
        assert_eq!(children, [&Tag::Book, &Tag::Chapter, &Tag::Para]);

        let book = &root.children[0];
        assert_eq!(book.code.as_deref(), Some("GEN"));
        assert_eq!(book.text.as_deref(), Some("World English Bible"));

        let chapter = &root.children[1];
        assert_eq!(chapter.number.as_deref(), Some("1"));
        assert_eq!(chapter.attributes[0], ("sid".to_string(), "GEN 1".to_string()));

        let para = &root.children[2];
        assert_eq!(para.text, None);
        assert_eq!(para.children[0].tail.as_deref(), Some("In the beginning, "));
        assert_eq!(para.children[1].text.as_deref(), Some("God"));
        assert_eq!(para.children[1].tail.as_deref(), Some(" created & made."));
        assert_eq!(para.children[2].caller.as_deref(), Some("+"));
        assert_eq!(para.children[2].children[0].text.as_deref(), Some("Or, heavens"));
    }

    #[test]
    fn written_usx_reads_back_the_same_tree() {
        let root = parse_usx(SAMPLE).unwrap();
        let xml = to_usx_string(&root).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(xml.contains("created &amp; made."));
        assert_eq!(parse_usx(&xml).unwrap(), root);
    }

    #[test]
    fn unclosed_document_is_an_error() {
        let err = parse_usx("<usx><para style=\"p\">text</usx>").unwrap_err();
        assert!(matches!(err, UsxError::Xml(_) | UsxError::Unclosed(_)));
        assert!(matches!(parse_usx("   ").unwrap_err(), UsxError::Empty));
    }
}
