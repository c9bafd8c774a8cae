//! A minimal element tree over `quick-xml` events.
//!
//! arXiv and PubMed both answer with XML whose interesting parts are a few levels deep. Reading
//! the whole body into a tree of [`XmlNode`]s keeps their normalizers short; the bodies are small
//! (one page of results) so holding them in memory is not a concern.

use quick_xml::{events::Event, Reader};

use super::*;

/// One element with its attributes, text and children. Names have their namespace prefix removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
  /// Local element name
  pub name:       String,
  /// Attributes by local name
  pub attributes: Vec<(String, String)>,
  /// All character data inside the element, including that of descendants, in document order
  pub text:       String,
  /// Child elements
  pub children:   Vec<XmlNode>,
}

impl XmlNode {
  /// First child named `name`.
  pub fn child(&self, name: &str) -> Option<&XmlNode> {
    self.children.iter().find(|child| child.name == name)
  }

  /// Every child named `name`.
  pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
    self.children.iter().filter(move |child| child.name == name)
  }

  /// Follows a `/` separated chain of child names.
  pub fn find(&self, path: &str) -> Option<&XmlNode> {
    path.split('/').try_fold(self, |node, name| node.child(name))
  }

  /// Every descendant (at any depth) named `name`, in document order.
  pub fn descendants<'a>(&'a self, name: &'a str) -> Vec<&'a XmlNode> {
    let mut found = Vec::new();
    for child in &self.children {
      if child.name == name {
        found.push(child);
      }
      found.extend(child.descendants(name));
    }
    found
  }

  /// Attribute value by local name.
  pub fn attr(&self, name: &str) -> Option<&str> {
    self.attributes.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
  }

  /// Text content with whitespace collapsed.
  pub fn text(&self) -> String { format::squash_whitespace(&self.text) }

  /// Collapsed text of the child at `path`, or an empty string.
  pub fn text_at(&self, path: &str) -> String {
    self.find(path).map(XmlNode::text).unwrap_or_default()
  }
}

/// Builds an [`XmlNode`] from the start tag of an element.
fn open(start: &quick_xml::events::BytesStart<'_>) -> XmlNode {
  let attributes = start
    .attributes()
    .flatten()
    .filter_map(|attr| {
      let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
      attr.unescape_value().ok().map(|value| (key, value.into_owned()))
    })
    .collect();
  XmlNode {
    name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
    attributes,
    ..XmlNode::default()
  }
}

/// Closes `node`, folding it into its parent.
fn close(parent: &mut XmlNode, node: XmlNode) {
  parent.text.push_str(&node.text);
  parent.children.push(node);
}

/// Parses `body` into a tree rooted at a synthetic `#document` node.
///
/// Fails only when the body is not well-formed XML.
pub fn parse_xml(body: &[u8]) -> Result<XmlNode> {
  let mut reader = Reader::from_reader(body);
  let mut stack = vec![XmlNode { name: "#document".into(), ..XmlNode::default() }];
  let mut buf = Vec::new();

  loop {
    match reader.read_event_into(&mut buf)? {
      Event::Start(e) => stack.push(open(&e)),
      Event::Empty(e) => {
        let node = open(&e);
        if let Some(parent) = stack.last_mut() {
          close(parent, node);
        }
      },
      Event::Text(e) => {
        let text = e.unescape()?;
        if let Some(node) = stack.last_mut() {
          node.text.push_str(&text);
        }
      },
      Event::CData(e) => {
        let data = e.into_inner();
        if let Some(node) = stack.last_mut() {
          node.text.push_str(&String::from_utf8_lossy(&data));
        }
      },
      Event::End(_) =>
        if stack.len() > 1 {
          if let Some(node) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
              close(parent, node);
            }
          }
        },
      Event::Eof => break,
      _ => (),
    }
    buf.clear();
  }

  while stack.len() > 1 {
    if let Some(node) = stack.pop() {
      if let Some(parent) = stack.last_mut() {
        close(parent, node);
      }
    }
  }
  stack.pop().ok_or_else(|| DocuFetchError::Parse("empty XML document".into()))
}
