use crate::element::Element;
use crate::path::NodePath;
use std::collections::HashMap;

/// Read cursor positioned at one element of a parsed document.
///
/// Cursors are cheap to clone and carry the element's [`NodePath`], which
/// the decode-side graph context uses to resolve relative references.
#[derive(Debug, Clone)]
pub struct XmlReader<'a> {
    element: &'a Element,
    path: NodePath,
}

impl<'a> XmlReader<'a> {
    pub fn new(root: &'a Element) -> Self {
        Self {
            element: root,
            path: NodePath::root(root.name()),
        }
    }

    /// Cursor at `path` inside the document rooted at `root`.
    pub fn locate(root: &'a Element, path: &NodePath) -> Option<Self> {
        let (first, rest) = path.segments().split_first()?;
        if first.name != root.name() || first.index != 1 {
            return None;
        }

        let mut reader = Self::new(root);
        for segment in rest {
            let next = reader
                .children()
                .filter(|child| child.name() == segment.name)
                .nth(segment.index.checked_sub(1)?)?;
            reader = next;
        }
        Some(reader)
    }

    /// First element in document order, `root` included, whose attribute
    /// `name` equals `value`.
    pub fn find_by_attribute(root: &'a Element, name: &str, value: &str) -> Option<Self> {
        let mut pending = vec![Self::new(root)];
        while let Some(reader) = pending.pop() {
            if reader.attribute(name) == Some(value) {
                return Some(reader);
            }
            let children: Vec<XmlReader<'a>> = reader.children().collect();
            pending.extend(children.into_iter().rev());
        }
        None
    }

    pub fn name(&self) -> &'a str {
        self.element.name()
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.element.attribute(name)
    }

    /// Text content of the element, if any.
    pub fn value(&self) -> Option<&'a str> {
        self.element.text()
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    /// Cursors over the child elements, in document order.
    pub fn children(&self) -> impl Iterator<Item = XmlReader<'a>> + '_ {
        let mut counts: HashMap<&'a str, usize> = HashMap::new();
        let children: &'a [Element] = self.element.children();
        children.iter().map(move |child| {
            let index = counts.entry(child.name()).or_insert(0);
            *index += 1;
            XmlReader {
                element: child,
                path: self.path.child(child.name(), *index),
            }
        })
    }

    /// First child element named `name`.
    pub fn child(&self, name: &str) -> Option<XmlReader<'a>> {
        self.children().find(|child| child.name() == name)
    }

    /// Text of the first child element named `name`.
    pub fn child_value(&self, name: &str) -> Option<&'a str> {
        self.element
            .children()
            .iter()
            .find(|child| child.name() == name)
            .and_then(Element::text)
    }

    /// True when the element carries `name` as an attribute or child element.
    pub fn has_field(&self, name: &str) -> bool {
        self.attribute(name).is_some()
            || self
                .element
                .children()
                .iter()
                .any(|child| child.name() == name)
    }
}
