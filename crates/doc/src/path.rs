use std::fmt;

/// One step of a [`NodePath`]: an element name and its 1-based position
/// among same-named siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub name: String,
    pub index: usize,
}

impl PathSegment {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.strip_suffix(']').and_then(|rest| rest.split_once('[')) {
            Some((name, index)) => {
                let index: usize = index.parse().ok()?;
                if name.is_empty() || index == 0 {
                    return None;
                }
                Some(Self::new(name, index))
            }
            None if !raw.is_empty() && !raw.contains(|c: char| c == '[' || c == ']') => {
                Some(Self::new(raw, 1))
            }
            None => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 1 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}[{}]", self.name, self.index)
        }
    }
}

/// Absolute location of an element inside one document.
///
/// Paths key the decode-side object table so that relative `reference`
/// markers (`../../entity`) written by older tooling resolve to the element
/// they point at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<PathSegment>);

impl NodePath {
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![PathSegment::new(name, 1)])
    }

    pub fn child(&self, name: impl Into<String>, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::new(name, index));
        Self(segments)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Reference string leading from `origin` to `self`.
    pub fn relative_from(&self, origin: &NodePath) -> String {
        let common = self
            .0
            .iter()
            .zip(origin.0.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut parts: Vec<String> = Vec::new();
        parts.extend(std::iter::repeat("..".to_string()).take(origin.0.len() - common));
        parts.extend(self.0[common..].iter().map(ToString::to_string));

        if parts.is_empty() {
            ".".to_string()
        } else {
            parts.join("/")
        }
    }

    /// Resolve a reference string against this path (the referencing element).
    ///
    /// Absolute references start with `/`. Returns `None` when the reference
    /// climbs above the document root or contains a malformed step.
    pub fn resolve(&self, reference: &str) -> Option<NodePath> {
        let mut segments = if reference.starts_with('/') {
            Vec::new()
        } else {
            self.0.clone()
        };

        for step in reference.split('/').filter(|step| !step.is_empty()) {
            match step {
                "." => {}
                ".." => {
                    segments.pop()?;
                }
                other => segments.push(PathSegment::parse(other)?),
            }
        }

        if segments.is_empty() {
            return None;
        }
        Some(NodePath(segments))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
