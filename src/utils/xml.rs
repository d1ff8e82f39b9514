/*!
One-line description.

More detailed description, with

# Example

*/

use quick_xml::events::{attributes::Attribute, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct Element {
    name: Vec<u8>,
}

pub trait Writable<T: Write> {
    fn write(&self, writer: &mut Writer<T>) -> Result<(), quick_xml::Error>;
}

/// A minimal parsed element: local tag name (namespace prefix stripped), attributes, direct text
/// content, and child elements in document order. Enough to navigate device and SCPD documents
/// without pulling in a full DOM.
#[derive(Clone, Debug, Default)]
pub struct Node {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Node>,
}

pub const X_DECL_VERSION: &[u8] = b"1.0";

pub const X_ATTR_NAMESPACE: &str = "xmlns";

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

pub fn start<T: Write>(writer: &mut Writer<T>) -> Result<(), quick_xml::Error> {
    writer
        .write_event(Event::Decl(BytesDecl::new(X_DECL_VERSION, None, None)))
        .map(|_| ())
}

pub fn element<T: Write>(writer: &mut Writer<T>, name: impl AsRef<[u8]>) -> Result<(), quick_xml::Error> {
    let name = name.as_ref();
    writer.write_event(Event::Start(BytesStart::borrowed_name(name)))?;
    writer
        .write_event(Event::End(BytesEnd::borrowed(name)))
        .map(|_| ())
}

pub fn start_element<T: Write>(writer: &mut Writer<T>, name: impl AsRef<[u8]>) -> Result<Element, quick_xml::Error> {
    let name = name.as_ref();
    writer.write_event(Event::Start(BytesStart::borrowed_name(name)))?;
    Ok(Element { name: name.to_vec() })
}

pub fn start_ns_element<T: Write>(
    writer: &mut Writer<T>,
    name: impl AsRef<[u8]>,
    namespace: &str,
    prefix: Option<&str>,
) -> Result<Element, quick_xml::Error> {
    let attr_name = match prefix {
        None => X_ATTR_NAMESPACE.to_string(),
        Some(p) => format!("{}:{}", X_ATTR_NAMESPACE, p),
    };
    start_element_with(writer, name, vec![(attr_name.as_str(), namespace)])
}

pub fn start_element_with<T: Write>(
    writer: &mut Writer<T>,
    name: impl AsRef<[u8]>,
    attrs: Vec<(&str, &str)>,
) -> Result<Element, quick_xml::Error> {
    let name = name.as_ref();
    let mut element = BytesStart::borrowed_name(name);
    for (name, value) in attrs {
        element.push_attribute(Attribute::from((name, value)));
    }
    writer.write_event(Event::Start(element))?;
    Ok(Element { name: name.to_vec() })
}

pub fn end_element<T: Write>(writer: &mut Writer<T>, name: &[u8]) -> Result<(), quick_xml::Error> {
    writer
        .write_event(Event::End(BytesEnd::borrowed(name)))
        .map(|_| ())
}

pub fn text_element<T: Write>(
    writer: &mut Writer<T>,
    name: impl AsRef<[u8]>,
    content: &[u8],
) -> Result<(), quick_xml::Error> {
    let element = start_element(writer, name)?;
    writer.write_event(Event::Text(BytesText::from_plain(content)))?;
    element.end(writer)
}

/// Parses `xml` into a single root [`Node`], stripping namespace prefixes from tag names (callers
/// match on local names; the device and SCPD schemas only ever use one namespace at a time).
pub fn read_element_tree(xml: &str) -> Result<Node, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event(&mut buf)? {
            Event::Start(ref ev) => {
                stack.push(Node {
                    name: local_name(ev.name()),
                    attributes: read_attributes(ev),
                    text: String::new(),
                    children: Vec::new(),
                });
            }
            Event::Empty(ref ev) => {
                let node = Node {
                    name: local_name(ev.name()),
                    attributes: read_attributes(ev),
                    text: String::new(),
                    children: Vec::new(),
                };
                push_child(&mut stack, &mut root, node);
            }
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    push_child(&mut stack, &mut root, node);
                }
            }
            Event::Text(ref ev) => {
                let text = ev.unescape_and_decode(&reader).unwrap_or_default();
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    root.ok_or_else(|| {
        quick_xml::Error::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "empty XML document"))
    })
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Element {
    pub fn end<T: Write>(&self, writer: &mut Writer<T>) -> Result<(), quick_xml::Error> {
        end_element(writer, &self.name)
    }
}

impl Node {
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn local_name(raw: &[u8]) -> String {
    let s = String::from_utf8_lossy(raw);
    match s.rfind(':') {
        Some(idx) => s[idx + 1..].to_string(),
        None => s.to_string(),
    }
}

fn read_attributes(ev: &BytesStart) -> Vec<(String, String)> {
    ev.attributes()
        .filter_map(|a| a.ok())
        .map(|a| {
            (
                local_name(a.key),
                String::from_utf8_lossy(&a.value).to_string(),
            )
        })
        .collect()
}

fn push_child(stack: &mut Vec<Node>, root: &mut Option<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------
