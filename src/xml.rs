//! Minimal XML element tree. Documents are built as a tree and rendered
//! in one pass, so the output is always a single well-formed root with
//! every text and attribute value escaped.
use std::borrow::Cow;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
  Element(Element),
  Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
  name: &'static str,
  attrs: Vec<(&'static str, String)>,
  children: Vec<Node>,
}

impl Element {
  pub fn new(name: &'static str) -> Self {
    Self {
      name,
      attrs: vec![],
      children: vec![],
    }
  }

  /// Shorthand for `<name>text</name>`
  pub fn with_text(name: &'static str, text: impl Into<String>) -> Self {
    Self::new(name).text(text)
  }

  pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
    self.attrs.push((name, value.into()));
    self
  }

  pub fn child(mut self, child: Element) -> Self {
    self.children.push(Node::Element(child));
    self
  }

  pub fn children<I: IntoIterator<Item = Element>>(mut self, children: I) -> Self {
    self
      .children
      .extend(children.into_iter().map(Node::Element));
    self
  }

  pub fn text(mut self, text: impl Into<String>) -> Self {
    self.children.push(Node::Text(text.into()));
    self
  }

  fn is_inline(&self) -> bool {
    self.children.iter().all(|c| matches!(c, Node::Text(_)))
  }

  fn write(&self, out: &mut String, depth: usize) {
    out.push('<');
    out.push_str(self.name);
    for (name, value) in self.attrs.iter() {
      out.push(' ');
      out.push_str(name);
      out.push_str("=\"");
      out.push_str(&escape(value));
      out.push('"');
    }

    if self.children.is_empty() {
      out.push_str("/>");
      return;
    }
    out.push('>');

    if self.is_inline() {
      for child in self.children.iter() {
        if let Node::Text(text) = child {
          out.push_str(&escape(text));
        }
      }
    } else {
      for child in self.children.iter() {
        out.push('\n');
        out.push_str(&INDENT.repeat(depth + 1));
        match child {
          Node::Element(el) => el.write(out, depth + 1),
          Node::Text(text) => out.push_str(&escape(text)),
        }
      }
      out.push('\n');
      out.push_str(&INDENT.repeat(depth));
    }

    out.push_str("</");
    out.push_str(self.name);
    out.push('>');
  }
}

/// Escapes markup-significant characters. Control characters that XML 1.0
/// cannot represent at all are dropped.
pub fn escape(src: &str) -> Cow<'_, str> {
  let needs_escape = src
    .chars()
    .any(|c| matches!(c, '<' | '>' | '&' | '"' | '\'') || is_forbidden(c));
  if !needs_escape {
    return Cow::Borrowed(src);
  }

  let mut res = String::with_capacity(src.len() + 16);
  for c in src.chars() {
    match c {
      '<' => res.push_str("&lt;"),
      '>' => res.push_str("&gt;"),
      '&' => res.push_str("&amp;"),
      '"' => res.push_str("&quot;"),
      '\'' => res.push_str("&apos;"),
      c if is_forbidden(c) => {}
      c => res.push(c),
    }
  }
  Cow::Owned(res)
}

fn is_forbidden(c: char) -> bool {
  (c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r')) || matches!(c, '\u{FFFE}' | '\u{FFFF}')
}

/// Renders a complete document: declaration followed by the root element
pub fn render_document(root: &Element) -> String {
  let mut out = String::from(DECLARATION);
  out.push('\n');
  root.write(&mut out, 0);
  out.push('\n');
  out
}
