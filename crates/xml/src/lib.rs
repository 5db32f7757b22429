//! XML data source for the XPath engine, backed by `roxmltree`.

use roxmltree::Node;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use xtract_xpath1::{DataSourceNode, NodeType, QName, XML_NAMESPACE};

/// Wrapper around roxmltree::Document providing data source capabilities
pub struct XmlDocument<'input> {
    doc: roxmltree::Document<'input>,
}

impl<'input> XmlDocument<'input> {
    pub fn parse(text: &'input str) -> Result<Self, roxmltree::Error> {
        let doc = roxmltree::Document::parse(text)?;
        Ok(Self { doc })
    }

    /// The document node, parent of the document element.
    pub fn root_node(&self) -> XmlNode<'_, 'input> {
        XmlNode::Tree(self.doc.root())
    }
}

/// A node of the parsed document. Attributes need their own variant because
/// roxmltree stores them as data on elements, not as navigable nodes.
#[derive(Debug, Clone, Copy)]
pub enum XmlNode<'a, 'input> {
    /// The root, an element, text, comment, or processing instruction.
    Tree(Node<'a, 'input>),
    /// An attribute, represented by its owning element and the attribute index
    Attribute {
        parent: Node<'a, 'input>,
        index: usize,
    },
}

impl<'a, 'input> XmlNode<'a, 'input> {
    fn owner(&self) -> Node<'a, 'input> {
        match self {
            XmlNode::Tree(node) => *node,
            XmlNode::Attribute { parent, .. } => *parent,
        }
    }
}

impl<'a, 'input> PartialEq for XmlNode<'a, 'input> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<'a, 'input> Eq for XmlNode<'a, 'input> {}

impl<'a, 'input> PartialOrd for XmlNode<'a, 'input> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a, 'input> Ord for XmlNode<'a, 'input> {
    /// Document order. roxmltree numbers nodes in preorder; an element's
    /// attributes sort after the element itself and before its first child.
    fn cmp(&self, other: &Self) -> Ordering {
        let by_owner = self.owner().id().get().cmp(&other.owner().id().get());
        match (self, other) {
            (XmlNode::Tree(_), XmlNode::Tree(_)) => by_owner,
            (XmlNode::Attribute { index: i1, .. }, XmlNode::Attribute { index: i2, .. }) => {
                by_owner.then(i1.cmp(i2))
            }
            (XmlNode::Tree(_), XmlNode::Attribute { .. }) => by_owner.then(Ordering::Less),
            (XmlNode::Attribute { .. }, XmlNode::Tree(_)) => by_owner.then(Ordering::Greater),
        }
    }
}

impl<'a, 'input> Hash for XmlNode<'a, 'input> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            XmlNode::Tree(node) => {
                0u8.hash(state);
                node.id().hash(state);
            }
            XmlNode::Attribute { parent, index } => {
                1u8.hash(state);
                parent.id().hash(state);
                index.hash(state);
            }
        }
    }
}

impl<'a> DataSourceNode<'a> for XmlNode<'a, 'a> {
    fn node_type(&self) -> NodeType {
        match self {
            XmlNode::Tree(node) => {
                if node.is_root() {
                    NodeType::Root
                } else if node.is_text() {
                    NodeType::Text
                } else if node.is_comment() {
                    NodeType::Comment
                } else if node.is_pi() {
                    NodeType::ProcessingInstruction
                } else {
                    NodeType::Element
                }
            }
            XmlNode::Attribute { .. } => NodeType::Attribute,
        }
    }

    fn name(&self) -> Option<QName<'a>> {
        match self {
            XmlNode::Tree(node) if node.is_element() => {
                let tag = node.tag_name();
                let namespace = tag.namespace();
                Some(QName {
                    prefix: namespace.and_then(|uri| node.lookup_prefix(uri)),
                    namespace,
                    local_part: tag.name(),
                })
            }
            XmlNode::Tree(node) => node.pi().map(|pi| QName::local(pi.target)),
            XmlNode::Attribute { parent, index } => {
                parent.attributes().nth(*index).map(|attr| {
                    let namespace = attr.namespace();
                    let prefix = match namespace {
                        Some(XML_NAMESPACE) => Some("xml"),
                        Some(uri) => parent.lookup_prefix(uri),
                        None => None,
                    };
                    QName {
                        prefix,
                        namespace,
                        local_part: attr.name(),
                    }
                })
            }
        }
    }

    fn string_value(&self) -> String {
        match self {
            XmlNode::Tree(node) => {
                if node.is_element() || node.is_root() {
                    node.descendants()
                        .filter(|n| n.is_text())
                        .filter_map(|n| n.text())
                        .collect()
                } else if node.is_pi() {
                    node.pi()
                        .and_then(|pi| pi.value)
                        .unwrap_or_default()
                        .to_string()
                } else {
                    // Text and comment nodes carry their content directly.
                    node.text().unwrap_or_default().to_string()
                }
            }
            XmlNode::Attribute { parent, index } => parent
                .attributes()
                .nth(*index)
                .map(|attr| attr.value().to_string())
                .unwrap_or_default(),
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Tree(node) if node.is_element() => {
                let parent = *node;
                let attr_count = node.attributes().len();
                Box::new((0..attr_count).map(move |index| XmlNode::Attribute { parent, index }))
            }
            _ => Box::new(std::iter::empty()),
        }
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Tree(node) => Box::new(node.children().map(XmlNode::Tree)),
            XmlNode::Attribute { .. } => Box::new(std::iter::empty()),
        }
    }

    fn parent(&self) -> Option<Self> {
        match self {
            XmlNode::Tree(node) => node.parent().map(XmlNode::Tree),
            XmlNode::Attribute { parent, .. } => Some(XmlNode::Tree(*parent)),
        }
    }
}
