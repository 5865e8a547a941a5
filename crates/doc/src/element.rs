use crate::config::{DocConfig, DEFAULT_MAX_DEPTH};
use crate::error::{DocError, Result};
use roxmltree::Edge;

/// Owned element tree: the in-memory form of one document.
///
/// Mixed content is not modelled. An element either carries text or child
/// elements; whitespace between child elements is discarded on parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Set an attribute, replacing any previous value under the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// True when the element has no attributes, text or children.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.text.is_none() && self.children.is_empty()
    }

    /// Parse a document nested at most [`DEFAULT_MAX_DEPTH`] levels deep.
    pub fn parse(input: &str) -> Result<Element> {
        Self::parse_with_limit(input, DEFAULT_MAX_DEPTH)
    }

    /// Parse a document and return its root element.
    ///
    /// Fails with [`DocError::DepthExceeded`] as soon as an element sits
    /// deeper than `max_depth` (the root is at depth 1).
    pub fn parse_with_limit(input: &str, max_depth: usize) -> Result<Element> {
        let doc = roxmltree::Document::parse(input).map_err(|e| DocError::parse(e.to_string()))?;
        element_from_node(doc.root_element(), max_depth)
    }

    /// Render the element (and its subtree) as markup.
    pub fn render(&self, config: &DocConfig) -> String {
        let mut out = String::new();
        if config.xml_declaration {
            out.push_str("<?xml version='1.0' encoding='UTF-8'?>");
            if config.indent.is_some() {
                out.push('\n');
            }
        }

        let indent = config.indent;
        let mut pending = vec![RenderStep::Open(self, 0)];
        while let Some(step) = pending.pop() {
            match step {
                RenderStep::Open(element, depth) => {
                    pad(&mut out, indent, depth);
                    out.push('<');
                    out.push_str(&element.name);
                    for (key, value) in &element.attributes {
                        out.push(' ');
                        out.push_str(key);
                        out.push_str("=\"");
                        out.push_str(&escape(value, true));
                        out.push('"');
                    }

                    if element.children.is_empty() {
                        match &element.text {
                            None => out.push_str("/>"),
                            Some(text) => {
                                out.push('>');
                                out.push_str(&escape(text, false));
                                close_tag(&mut out, &element.name);
                            }
                        }
                        newline(&mut out, indent);
                        continue;
                    }

                    out.push('>');
                    newline(&mut out, indent);
                    pending.push(RenderStep::Close(element, depth));
                    pending.extend(
                        element
                            .children
                            .iter()
                            .rev()
                            .map(|child| RenderStep::Open(child, depth + 1)),
                    );
                }
                RenderStep::Close(element, depth) => {
                    pad(&mut out, indent, depth);
                    close_tag(&mut out, &element.name);
                    newline(&mut out, indent);
                }
            }
        }
        out
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut child) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}

enum RenderStep<'e> {
    Open(&'e Element, usize),
    Close(&'e Element, usize),
}

struct OpenElement {
    element: Element,
    text: String,
}

impl OpenElement {
    fn finish(mut self) -> Element {
        if self.element.children.is_empty() && !self.text.is_empty() {
            self.element.text = Some(std::mem::take(&mut self.text));
        }
        self.element
    }
}

fn element_from_node(root: roxmltree::Node<'_, '_>, max_depth: usize) -> Result<Element> {
    let mut stack: Vec<OpenElement> = Vec::new();
    for edge in root.traverse() {
        match edge {
            Edge::Open(node) if node.is_element() => {
                if stack.len() >= max_depth {
                    return Err(DocError::DepthExceeded(max_depth));
                }
                let mut element = Element::new(node.tag_name().name());
                for attr in node.attributes() {
                    element
                        .attributes
                        .push((attr.name().to_string(), attr.value().to_string()));
                }
                stack.push(OpenElement {
                    element,
                    text: String::new(),
                });
            }
            Edge::Open(node) if node.is_text() => {
                if let (Some(open), Some(chunk)) = (stack.last_mut(), node.text()) {
                    open.text.push_str(chunk);
                }
            }
            Edge::Close(node) if node.is_element() => {
                let closed = stack
                    .pop()
                    .ok_or_else(|| DocError::parse("unbalanced element traversal"))?
                    .finish();
                match stack.last_mut() {
                    Some(parent) => parent.element.children.push(closed),
                    None => return Ok(closed),
                }
            }
            _ => {}
        }
    }
    Err(DocError::parse("document has no root element"))
}

fn close_tag(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn pad(out: &mut String, indent: Option<usize>, depth: usize) {
    if let Some(width) = indent {
        out.extend(std::iter::repeat(' ').take(width * depth));
    }
}

fn newline(out: &mut String, indent: Option<usize>) {
    if indent.is_some() {
        out.push('\n');
    }
}

fn escape(raw: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            '\r' => escaped.push_str("&#xD;"),
            '\n' if attribute => escaped.push_str("&#xA;"),
            '\t' if attribute => escaped.push_str("&#x9;"),
            other => escaped.push(other),
        }
    }
    escaped
}
