//! Contains pure functions for collecting nodes along each XPath axis.
//!
//! Every collector appends in axis order: document order for forward axes, and
//! nearest-first for reverse axes. Duplicates across several context nodes are
//! removed by the caller.

use crate::ast::Axis;
use crate::datasource::{DataSourceNode, NodeType};

/// Appends the nodes on `axis` from `node` to `results`.
pub fn collect<'a, N: DataSourceNode<'a>>(axis: Axis, node: N, results: &mut Vec<N>) {
    match axis {
        Axis::Child => collect_child_nodes(node, results),
        Axis::Attribute => collect_attribute_nodes(node, results),
        Axis::Descendant => collect_descendant_nodes(node, results),
        Axis::DescendantOrSelf => collect_descendant_or_self_nodes(node, results),
        Axis::Parent => collect_parent_nodes(node, results),
        Axis::Ancestor => collect_ancestor_nodes(node, results),
        Axis::AncestorOrSelf => {
            results.push(node);
            collect_ancestor_nodes(node, results);
        }
        Axis::SelfAxis => results.push(node),
        Axis::FollowingSibling => collect_following_sibling_nodes(node, results),
        Axis::PrecedingSibling => collect_preceding_sibling_nodes(node, results),
        Axis::Following => collect_following_nodes(node, results),
        Axis::Preceding => collect_preceding_nodes(node, results),
    }
}

pub fn collect_child_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    results.extend(node.children());
}

pub fn collect_attribute_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    results.extend(node.attributes());
}

pub fn collect_descendant_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    for child in node.children() {
        results.push(child);
        collect_descendant_nodes(child, results);
    }
}

pub fn collect_descendant_or_self_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    results.push(node);
    collect_descendant_nodes(node, results);
}

pub fn collect_parent_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    if let Some(parent) = node.parent() {
        results.push(parent);
    }
}

pub fn collect_ancestor_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node.parent();
    while let Some(p) = current {
        results.push(p);
        current = p.parent();
    }
}

pub fn collect_following_sibling_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    if node.node_type() == NodeType::Attribute {
        return;
    }
    if let Some(parent) = node.parent() {
        results.extend(parent.children().skip_while(|s| *s != node).skip(1));
    }
}

pub fn collect_preceding_sibling_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    if node.node_type() == NodeType::Attribute {
        return;
    }
    if let Some(parent) = node.parent() {
        let siblings: Vec<N> = parent.children().take_while(|s| *s != node).collect();
        results.extend(siblings.into_iter().rev());
    }
}

pub fn collect_following_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node;
    // Everything inside an attribute's owner element comes after the attribute.
    if node.node_type() == NodeType::Attribute {
        if let Some(owner) = node.parent() {
            collect_descendant_nodes(owner, results);
            current = owner;
        }
    }
    let mut current = Some(current);
    while let Some(c) = current {
        let parent = c.parent();
        if let Some(p) = parent {
            for sibling in p.children().skip_while(|s| *s != c).skip(1) {
                collect_descendant_or_self_nodes(sibling, results);
            }
        }
        current = parent;
    }
}

pub fn collect_preceding_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let start = if node.node_type() == NodeType::Attribute {
        match node.parent() {
            Some(owner) => owner,
            None => return,
        }
    } else {
        node
    };

    let mut preceding = Vec::new();
    let mut current = Some(start);
    while let Some(c) = current {
        let parent = c.parent();
        if let Some(p) = parent {
            for sibling in p.children().take_while(|s| *s != c) {
                collect_descendant_or_self_nodes(sibling, &mut preceding);
            }
        }
        current = parent;
    }
    preceding.sort_unstable_by(|a, b| b.cmp(a));
    results.extend(preceding);
}
