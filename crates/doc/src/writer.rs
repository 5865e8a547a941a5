use crate::element::Element;
use crate::error::{DocError, Result};
use crate::path::NodePath;
use std::collections::HashMap;

struct OpenNode {
    element: Element,
    path: NodePath,
    sibling_counts: HashMap<String, usize>,
}

impl OpenNode {
    fn new(name: &str, path: NodePath) -> Self {
        Self {
            element: Element::new(name),
            path,
            sibling_counts: HashMap::new(),
        }
    }
}

/// Streaming builder for one document tree.
///
/// The root element is open from construction; nodes are opened and closed
/// in strict nesting order. Each open node knows its [`NodePath`] so that
/// shared objects can be referenced by relative path.
pub struct XmlWriter {
    stack: Vec<OpenNode>,
}

impl XmlWriter {
    pub fn new(root: &str) -> Self {
        Self {
            stack: vec![OpenNode::new(root, NodePath::root(root))],
        }
    }

    pub fn start_node(&mut self, name: &str) {
        let path = match self.stack.last_mut() {
            Some(parent) => {
                let index = parent.sibling_counts.entry(name.to_string()).or_insert(0);
                *index += 1;
                parent.path.child(name, *index)
            }
            None => NodePath::root(name),
        };
        self.stack.push(OpenNode::new(name, path));
    }

    pub fn add_attribute(&mut self, name: &str, value: impl Into<String>) {
        if let Some(node) = self.stack.last_mut() {
            node.element.set_attribute(name, value);
        }
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        if let Some(node) = self.stack.last_mut() {
            node.element.set_text(value);
        }
    }

    pub fn end_node(&mut self) -> Result<()> {
        if self.stack.len() < 2 {
            return Err(DocError::writer("end_node called with no open child node"));
        }
        let closed = self
            .stack
            .pop()
            .ok_or_else(|| DocError::writer("writer stack is empty"))?;
        if let Some(parent) = self.stack.last_mut() {
            parent.element.push_child(closed.element);
        }
        Ok(())
    }

    /// Path of the innermost open node.
    pub fn path(&self) -> NodePath {
        self.stack
            .last()
            .map(|node| node.path.clone())
            .unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Close the root and return the finished tree.
    pub fn finish(mut self) -> Result<Element> {
        if self.stack.len() != 1 {
            return Err(DocError::writer(format!(
                "{} node(s) left open at finish",
                self.stack.len().saturating_sub(1)
            )));
        }
        self.stack
            .pop()
            .map(|root| root.element)
            .ok_or_else(|| DocError::writer("writer stack is empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tracks_sibling_indexes_in_paths() {
        let mut writer = XmlWriter::new("build");
        writer.start_node("causes");
        writer.start_node("triggerCause");
        writer.end_node().unwrap();
        writer.start_node("triggerCause");
        assert_eq!(writer.path().to_string(), "/build/causes/triggerCause[2]");
        writer.end_node().unwrap();
        writer.end_node().unwrap();

        let root = writer.finish().unwrap();
        assert_eq!(root.children()[0].children().len(), 2);
    }

    #[test]
    fn values_and_attributes_land_on_the_open_node() {
        let mut writer = XmlWriter::new("context");
        writer.start_node("thisBuild");
        for (name, value) in [("buildNumber", "100"), ("projectId", "projectX")] {
            writer.start_node(name);
            writer.set_value(value);
            writer.end_node().unwrap();
        }
        writer.end_node().unwrap();
        writer.add_attribute("id", "1");

        let root = writer.finish().unwrap();
        assert_eq!(root.attribute("id"), Some("1"));
        let this_build = &root.children()[0];
        assert_eq!(this_build.name(), "thisBuild");
        assert_eq!(this_build.children()[1].text(), Some("projectX"));
    }

    #[test]
    fn unbalanced_writes_are_rejected() {
        let mut writer = XmlWriter::new("context");
        assert!(writer.end_node().is_err());

        writer.start_node("others");
        assert!(writer.finish().is_err());
    }
}
