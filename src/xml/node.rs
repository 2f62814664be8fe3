/// Where a parsed element lives in the source buffer.
///
/// Used by the renderer to copy untouched bytes verbatim.
#[derive(Debug, Clone)]
pub(crate) struct SourceSpan {
    /// Offset of the opening `<`.
    pub(crate) start: usize,
    /// Offset just past the closing `>`.
    pub(crate) end: usize,
    /// Content range between the start and end tag; `None` for `<empty/>`.
    pub(crate) inner: Option<(usize, usize)>,
    /// First to last non-whitespace text byte inside the element, if any.
    pub(crate) text: Option<(usize, usize)>,
    /// Value as parsed, compared against the live value to detect rewrites.
    pub(crate) value: Option<String>,
    /// `(start, end)` of each child element present in the source, in order.
    pub(crate) child_spans: Vec<(usize, usize)>,
}

/// A named node with an optional string value and ordered children.
///
/// Children keep file order. The only structural mutation is appending, so
/// nodes that came from a parsed document always precede nodes added later.
/// Same-named siblings are allowed; name lookups return the first match.
#[derive(Debug, Clone)]
pub struct ConfigNode {
    name: String,
    value: Option<String>,
    children: Vec<ConfigNode>,
    source: Option<SourceSpan>,
}

impl ConfigNode {
    /// Create an empty node with no value and no children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            children: Vec::new(),
            source: None,
        }
    }

    /// Create a leaf node holding `value`.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::new(name)
        }
    }

    pub(crate) fn parsed(
        name: String,
        value: Option<String>,
        children: Vec<ConfigNode>,
        source: SourceSpan,
    ) -> Self {
        Self {
            name,
            value,
            children,
            source: Some(source),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    pub fn children(&self) -> &[ConfigNode] {
        &self.children
    }

    /// Mutable access to existing children. Cannot add, remove or reorder.
    pub fn children_mut(&mut self) -> std::slice::IterMut<'_, ConfigNode> {
        self.children.iter_mut()
    }

    /// Iterate over every child called `name`, in order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ConfigNode> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// First child called `name`.
    pub fn get_child(&self, name: &str) -> Option<&ConfigNode> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn get_child_mut(&mut self, name: &str) -> Option<&mut ConfigNode> {
        self.children.iter_mut().find(|child| child.name == name)
    }

    /// Value of the first child called `name`.
    pub fn child_value(&self, name: &str) -> Option<&str> {
        self.get_child(name).and_then(ConfigNode::value)
    }

    /// Append `child` after all existing children and return it.
    pub fn add_child(&mut self, child: ConfigNode) -> &mut ConfigNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Return the first child called `name`, appending an empty one if none exists.
    ///
    /// Calling this repeatedly with the same name never creates a second child.
    pub fn ensure_child(&mut self, name: &str) -> &mut ConfigNode {
        match self.children.iter().position(|child| child.name == name) {
            Some(idx) => &mut self.children[idx],
            None => self.add_child(ConfigNode::new(name)),
        }
    }

    pub(crate) fn source(&self) -> Option<&SourceSpan> {
        self.source.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(node: &ConfigNode) -> Vec<&str> {
        node.children().iter().map(ConfigNode::name).collect()
    }

    #[test]
    fn test_ensure_child_is_idempotent() {
        let mut root = ConfigNode::new("configuration");
        root.ensure_child("compilerArgs");
        root.ensure_child("compilerArgs");

        assert_eq!(root.children_named("compilerArgs").count(), 1);
    }

    #[test]
    fn test_ensure_child_returns_existing_node() {
        let mut root = ConfigNode::new("configuration");
        root.add_child(ConfigNode::with_value("source", "17"));

        let source = root.ensure_child("source");
        assert_eq!(source.value(), Some("17"));
        source.set_value("21");

        assert_eq!(root.child_value("source"), Some("21"));
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_add_child_appends_duplicates() {
        let mut paths = ConfigNode::new("annotationProcessorPaths");
        paths.add_child(ConfigNode::new("path"));
        paths.add_child(ConfigNode::new("path"));

        assert_eq!(names(&paths), vec!["path", "path"]);
    }

    #[test]
    fn test_get_child_returns_first_match() {
        let mut root = ConfigNode::new("compilerArgs");
        root.add_child(ConfigNode::with_value("arg", "-Xlint"));
        root.add_child(ConfigNode::with_value("arg", "-parameters"));

        assert_eq!(root.child_value("arg"), Some("-Xlint"));
        assert!(root.get_child("missing").is_none());
    }

    #[test]
    fn test_rewrite_preserves_sibling_order() {
        let mut root = ConfigNode::new("root");
        root.add_child(ConfigNode::with_value("A", "a"));
        root.add_child(ConfigNode::with_value("B", "b"));
        root.add_child(ConfigNode::with_value("C", "c"));

        if let Some(b) = root.get_child_mut("B") {
            b.set_value("b -changed");
        }

        assert_eq!(names(&root), vec!["A", "B", "C"]);
        assert_eq!(root.child_value("B"), Some("b -changed"));
    }

    proptest! {
        #[test]
        fn prop_ensure_child_never_duplicates(
            existing in proptest::collection::vec("[a-d]", 0..8),
            target in "[a-e]",
        ) {
            let mut root = ConfigNode::new("root");
            for name in &existing {
                root.add_child(ConfigNode::new(name.as_str()));
            }
            let before = root.children_named(&target).count();

            root.ensure_child(&target);
            root.ensure_child(&target);

            let after = root.children_named(&target).count();
            prop_assert_eq!(after, before.max(1));
            prop_assert_eq!(&names(&root)[..existing.len()], &existing.iter().map(String::as_str).collect::<Vec<_>>()[..]);
        }
    }
}
