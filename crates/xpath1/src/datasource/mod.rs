//! The node trait the engine navigates, plus the name and kind types it reports.
use std::hash::Hash;

/// An expanded, qualified name: the namespace URI the node belongs to, the prefix
/// it was written with (if the source keeps one), and the local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub namespace: Option<&'a str>,
    pub local_part: &'a str,
}

impl<'a> QName<'a> {
    pub fn local(local_part: &'a str) -> Self {
        Self {
            prefix: None,
            namespace: None,
            local_part,
        }
    }
}

/// The type of a node in the data source tree, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// The universal contract for a node in a read-only, hierarchical data source.
///
/// The XPath engine is written exclusively against this trait, so it can operate
/// on any tree that implements it. `Ord` must follow document order: a node sorts
/// before its attributes, and its attributes sort before its children.
///
/// `'a` is the lifetime of the underlying data source (e.g., the XML string).
pub trait DataSourceNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    /// The type of the node (Element, Text, Attribute, etc.).
    fn node_type(&self) -> NodeType;

    /// The expanded name of the node. Returns `None` for node types that do not
    /// have names, such as text or root nodes. For a processing-instruction, this
    /// is its target.
    fn name(&self) -> Option<QName<'a>>;

    /// The string value of the node, as defined by the XPath 1.0 `string()` function.
    /// - For a text node, this is its content.
    /// - For an element, this is the concatenation of the string values of all
    ///   its descendant text nodes.
    /// - For an attribute, this is its value.
    /// - For a comment or processing instruction, this is its content.
    fn string_value(&self) -> String;

    /// An iterator over the attribute nodes of this node.
    /// The iterator will be empty for non-element nodes.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// An iterator over the child nodes of this node, in document order.
    /// The iterator will be empty for leaf nodes (like text or attributes).
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// A reference to the parent node. Returns `None` for the root node. The parent
    /// of an attribute is its owning element.
    fn parent(&self) -> Option<Self>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::cmp::Ordering;
    use std::hash::Hasher;

    pub const NOTES_NAMESPACE: &str = "urn:example:notes";

    #[derive(Debug)]
    struct Entry<'a> {
        node_type: NodeType,
        name: Option<QName<'a>>,
        value: &'static str,
        parent: Option<usize>,
        attributes: Vec<usize>,
        children: Vec<usize>,
    }

    /// A flat arena of nodes. Ids are indexes and are handed out in document
    /// order, so comparing ids compares positions.
    #[derive(Debug, Default)]
    pub struct MockTree<'a> {
        entries: Vec<Entry<'a>>,
    }

    impl<'a> MockTree<'a> {
        fn push(
            &mut self,
            parent: Option<usize>,
            node_type: NodeType,
            name: Option<QName<'a>>,
            value: &'static str,
        ) -> usize {
            let id = self.entries.len();
            self.entries.push(Entry {
                node_type,
                name,
                value,
                parent,
                attributes: Vec::new(),
                children: Vec::new(),
            });
            if let Some(parent) = parent {
                let owner = &mut self.entries[parent];
                if node_type == NodeType::Attribute {
                    owner.attributes.push(id);
                } else {
                    owner.children.push(id);
                }
            }
            id
        }

        fn node(&'a self, id: usize) -> MockNode<'a> {
            MockNode { id, tree: self }
        }
    }

    #[derive(Debug, Clone, Copy)]
    pub struct MockNode<'a> {
        pub id: usize,
        pub tree: &'a MockTree<'a>,
    }

    impl MockNode<'_> {
        fn entry(&self) -> &Entry<'_> {
            &self.tree.entries[self.id]
        }
    }

    impl PartialEq for MockNode<'_> {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    impl Eq for MockNode<'_> {}

    impl PartialOrd for MockNode<'_> {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for MockNode<'_> {
        fn cmp(&self, other: &Self) -> Ordering {
            self.id.cmp(&other.id)
        }
    }

    impl Hash for MockNode<'_> {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl<'a> DataSourceNode<'a> for MockNode<'a> {
        fn node_type(&self) -> NodeType {
            self.entry().node_type
        }

        fn name(&self) -> Option<QName<'a>> {
            self.tree.entries[self.id].name
        }

        /// Elements and the root concatenate their descendant text.
        fn string_value(&self) -> String {
            match self.node_type() {
                NodeType::Root | NodeType::Element => self
                    .children()
                    .map(|child| match child.node_type() {
                        NodeType::Text | NodeType::Element => child.string_value(),
                        _ => String::new(),
                    })
                    .collect(),
                _ => self.entry().value.to_string(),
            }
        }

        fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            Box::new(tree.entries[self.id].attributes.iter().map(move |&id| tree.node(id)))
        }

        fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            Box::new(tree.entries[self.id].children.iter().map(move |&id| tree.node(id)))
        }

        fn parent(&self) -> Option<Self> {
            self.entry().parent.map(|id| self.tree.node(id))
        }
    }

    /// ```text
    /// <root>                                          id 0
    ///   <para id="p1" xml:lang="en">Hello</para>      id 1, attrs 2 & 3, text 4
    ///   <!-- comment node -->                         id 5
    ///   <div></div>                                   id 6
    ///   <?pi-target pi-value?>                        id 7
    ///   <para>World</para>                            id 8, text 9
    ///   <n:note xmlns:n="urn:example:notes"
    ///           n:ref="r1">Note</n:note>              id 10, attr 11, text 12
    /// </root>
    /// ```
    pub fn create_test_tree<'a>() -> MockTree<'a> {
        let notes = |local_part| QName {
            prefix: Some("n"),
            namespace: Some(NOTES_NAMESPACE),
            local_part,
        };
        let xml_lang = QName {
            prefix: Some("xml"),
            namespace: Some(crate::namespaces::XML_NAMESPACE),
            local_part: "lang",
        };

        let mut tree = MockTree::default();
        let root = tree.push(None, NodeType::Root, None, "");
        let para = tree.push(Some(root), NodeType::Element, Some(QName::local("para")), "");
        tree.push(Some(para), NodeType::Attribute, Some(QName::local("id")), "p1");
        tree.push(Some(para), NodeType::Attribute, Some(xml_lang), "en");
        tree.push(Some(para), NodeType::Text, None, "Hello");
        tree.push(Some(root), NodeType::Comment, None, " comment node ");
        tree.push(Some(root), NodeType::Element, Some(QName::local("div")), "");
        tree.push(
            Some(root),
            NodeType::ProcessingInstruction,
            Some(QName::local("pi-target")),
            "pi-value",
        );
        let second = tree.push(Some(root), NodeType::Element, Some(QName::local("para")), "");
        tree.push(Some(second), NodeType::Text, None, "World");
        let note = tree.push(Some(root), NodeType::Element, Some(notes("note")), "");
        tree.push(Some(note), NodeType::Attribute, Some(notes("ref")), "r1");
        tree.push(Some(note), NodeType::Text, None, "Note");
        tree
    }
}
