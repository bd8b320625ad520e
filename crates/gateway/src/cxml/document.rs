//! Minimal element tree built on the `quick-xml` pull parser.

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};

use super::CxmlError;

/// Deepest nesting accepted before the document is rejected.
const MAX_DEPTH: usize = 64;

/// An element with its local name, accumulated text, and child elements.
///
/// Attributes are not kept; nothing in the setup request needs them.
#[derive(Debug, Default)]
pub struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn named(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Parse a complete document and return its root element.
    pub fn parse(bytes: &[u8]) -> Result<Self, CxmlError> {
        let mut reader = Reader::from_reader(bytes);
        let mut stack: Vec<Self> = Vec::new();
        let mut root: Option<Self> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => {
                    if stack.is_empty() && root.is_some() {
                        return Err(malformed("more than one root element"));
                    }
                    if stack.len() >= MAX_DEPTH {
                        return Err(malformed("elements nested too deeply"));
                    }
                    check_attributes(&start)?;
                    stack.push(Self::named(utf8(start.local_name().as_ref())?.to_owned()));
                }
                Ok(Event::Empty(empty)) => {
                    check_attributes(&empty)?;
                    let element = Self::named(utf8(empty.local_name().as_ref())?.to_owned());
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| malformed("closing tag without an open element"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(text)) => push_text(&mut stack, utf8(&text)?)?,
                Ok(Event::CData(cdata)) => push_text(&mut stack, utf8(&cdata)?)?,
                Ok(Event::GeneralRef(reference)) => {
                    let resolved = match reference
                        .resolve_char_ref()
                        .map_err(|e| malformed(&e.to_string()))?
                    {
                        Some(ch) => Some(ch.to_string()),
                        // Custom entities declared in a DOCTYPE are never expanded.
                        None => resolve_predefined_entity(utf8(&reference)?).map(str::to_owned),
                    };
                    if let Some(resolved) = resolved {
                        push_text(&mut stack, &resolved)?;
                    }
                }
                Ok(Event::Eof) => break,
                // Declarations, DOCTYPE, comments and processing instructions
                Ok(_) => {}
                Err(e) => return Err(malformed(&e.to_string())),
            }
        }

        if let Some(open) = stack.last() {
            return Err(malformed(&format!("element <{}> is never closed", open.name)));
        }

        root.ok_or_else(|| malformed("document has no root element"))
    }

    /// Local name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed text content, or `None` when blank.
    pub fn text(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First element reached by following `path` through direct children.
    pub fn find_path(&self, path: &[&str]) -> Option<&Self> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };

        self.children
            .iter()
            .filter(|c| c.name == *first)
            .find_map(|c| c.find_path(rest))
    }

    /// First element, in document order, matching `path` starting at any
    /// descendant.
    pub fn find_anywhere(&self, path: &[&str]) -> Option<&Self> {
        let (first, rest) = path.split_first()?;

        self.children.iter().find_map(|child| {
            if child.name == *first {
                if let Some(found) = child.find_path(rest) {
                    return Some(found);
                }
            }
            child.find_anywhere(path)
        })
    }
}

fn malformed(detail: &str) -> CxmlError {
    CxmlError::MalformedDocument(detail.to_string())
}

/// Reject start tags whose attributes are not well-formed.
///
/// The pull parser only validates attributes when they are iterated.
fn check_attributes(start: &BytesStart<'_>) -> Result<(), CxmlError> {
    let mut attributes = start.attributes();
    attributes.with_checks(true);

    for attribute in attributes {
        let attribute = attribute.map_err(|e| malformed(&format!("invalid attribute: {e}")))?;
        if attribute.value.contains(&b'<') {
            return Err(malformed("'<' in attribute value"));
        }
    }
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<&str, CxmlError> {
    std::str::from_utf8(bytes).map_err(|e| malformed(&format!("invalid UTF-8: {e}")))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), CxmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(malformed("more than one root element"));
    }
    *root = Some(element);
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), CxmlError> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(malformed("text outside the root element")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree() {
        let root = Element::parse(b"<a><b>one</b><c><b>two</b></c></a>").unwrap();
        assert_eq!(root.name(), "a");
        assert_eq!(root.child("b").and_then(Element::text), Some("one"));
        assert_eq!(root.find_path(&["c", "b"]).and_then(Element::text), Some("two"));
        assert!(root.child("missing").is_none());
    }

    #[test]
    fn test_find_anywhere_document_order() {
        let xml = b"<r><x><From><Id>first</Id></From></x><From><Id>second</Id></From></r>";
        let root = Element::parse(xml).unwrap();
        assert_eq!(
            root.find_anywhere(&["From", "Id"]).and_then(Element::text),
            Some("first")
        );
    }

    #[test]
    fn test_find_anywhere_skips_partial_matches() {
        let xml = b"<r><From/><y><From><Id>deep</Id></From></y></r>";
        let root = Element::parse(xml).unwrap();
        assert_eq!(
            root.find_anywhere(&["From", "Id"]).and_then(Element::text),
            Some("deep")
        );
    }

    #[test]
    fn test_namespace_prefix_ignored() {
        let root = Element::parse(br#"<c:a xmlns:c="urn:x"><c:b>v</c:b></c:a>"#).unwrap();
        assert_eq!(root.child("b").and_then(Element::text), Some("v"));
    }

    #[test]
    fn test_predefined_entities_and_char_refs() {
        let root = Element::parse(b"<a>Fish &amp; Chips &lt;3 &#65;&#x42;</a>").unwrap();
        assert_eq!(root.text(), Some("Fish & Chips <3 AB"));
    }

    #[test]
    fn test_cdata() {
        let root = Element::parse(b"<a><![CDATA[<raw> & ok]]></a>").unwrap();
        assert_eq!(root.text(), Some("<raw> & ok"));
    }

    #[test]
    fn test_custom_entity_not_expanded() {
        let xml = br#"<?xml version="1.0"?>
<!DOCTYPE a [<!ENTITY inner "expanded">]>
<a>before&inner;after</a>"#;
        let root = Element::parse(xml).unwrap();
        assert_eq!(root.text(), Some("beforeafter"));
    }

    #[test]
    fn test_blank_text_is_none() {
        let root = Element::parse(b"<a>   </a>").unwrap();
        assert_eq!(root.text(), None);
    }

    #[test]
    fn test_malformed_inputs() {
        for input in [
            &b""[..],
            &b"not xml at all"[..],
            &b"<a><b></a>"[..],
            &b"<a>"[..],
            &b"<a></a><b></b>"[..],
            &b"<a></a>trailing"[..],
            &b"<a flag></a>"[..],
            &b"<a id=abc></a>"[..],
            &b"<a id=\"1\" id=\"2\"></a>"[..],
            &b"<a id=\"<\"></a>"[..],
            &b"<a><b id=abc/></a>"[..],
        ] {
            assert!(
                matches!(Element::parse(input), Err(CxmlError::MalformedDocument(_))),
                "expected malformed for {:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_well_formed_attributes_accepted() {
        let root = Element::parse(br#"<a x="1" y='two' z="&amp;&gt;"><b c="3"/></a>"#).unwrap();
        assert!(root.child("b").is_some());
    }

    #[test]
    fn test_invalid_utf8() {
        let result = Element::parse(b"<a>\xff\xfe</a>");
        assert!(matches!(result, Err(CxmlError::MalformedDocument(_))));
    }

    #[test]
    fn test_depth_limit() {
        let open = "<a>".repeat(MAX_DEPTH + 1);
        let close = "</a>".repeat(MAX_DEPTH + 1);
        let result = Element::parse(format!("{open}{close}").as_bytes());
        assert!(matches!(result, Err(CxmlError::MalformedDocument(_))));
    }
}
