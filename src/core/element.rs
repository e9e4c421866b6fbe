//! The document tree shared by the readers, the markup emitter and the USX writer.
//!
//! Text follows ElementTree conventions: `text` is the content before the first
//! child, `tail` is the content that follows the element inside its parent.
use crate::types::Tag;

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Tag,
    pub style: Option<String>,
    pub number: Option<String>,
    pub code: Option<String>,
    pub caller: Option<String>,
    /// Any attribute not covered by the fields above, in source order
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub tail: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            style: None,
            number: None,
            code: None,
            caller: None,
            attributes: Vec::new(),
            text: None,
            tail: None,
            children: Vec::new(),
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Set an attribute by name, routing the well-known ones to their fields.
    pub fn set_attribute(&mut self, key: &str, value: String) {
        match key {
            "style" => self.style = Some(value),
            "number" => self.number = Some(value),
            "code" => self.code = Some(value),
            "caller" => self.caller = Some(value),
            _ => self.attributes.push((key.to_string(), value)),
        }
    }

    /// All attributes in serialization order.
    pub fn attribute_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::new();
        let known = [
            ("code", &self.code),
            ("number", &self.number),
            ("style", &self.style),
            ("caller", &self.caller),
        ];
        for (key, value) in known {
            if let Some(v) = value {
                pairs.push((key, v.as_str()));
            }
        }
        pairs.extend(self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        pairs
    }

    /// Append character data at the current end of this element's content:
    /// into `text` while there are no children, otherwise into the last child's `tail`.
    pub fn append_text(&mut self, s: &str) {
        let slot = match self.children.last_mut() {
            Some(last) => &mut last.tail,
            None => &mut self.text,
        };
        slot.get_or_insert_with(String::new).push_str(s);
    }

    /// Depth-first, pre-order traversal of this element and all descendants.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }
}

pub struct Iter<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iter_visits_in_document_order() {
        let root = Element::new(Tag::Usx)
            .with_child(Element::new(Tag::Book).with_code("GEN"))
            .with_child(
                Element::new(Tag::Para)
                    .with_style("p")
                    .with_child(Element::new(Tag::Verse).with_number("1"))
                    .with_child(Element::new(Tag::Char).with_style("nd")),
            )
            .with_child(Element::new(Tag::Chapter).with_number("2"));

        let tags: Vec<&str> = root.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, ["usx", "book", "para", "verse", "char", "chapter"]);
    }

    #[test]
    fn append_text_fills_text_then_tails() {
        let mut para = Element::new(Tag::Para);
        para.append_text("a");
        para.append_text("b");
        para.children.push(Element::new(Tag::Verse));
        para.append_text("c");
        assert_eq!(para.text.as_deref(), Some("ab"));
        assert_eq!(para.children[0].tail.as_deref(), Some("c"));
    }
}
