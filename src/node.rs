//! The intermediate node tree between composition and construction.

use std::cell::RefCell;
use std::rc::Rc;

use crate::mark::Mark;
use crate::resolve::Tag;
use crate::token::ScalarStyle;

/// Shared handle to a node.
///
/// Aliases clone the handle, so a node referenced from several places (or
/// from inside itself) is one object; the constructor keys its caches on
/// this identity.
pub type NodeRef = Rc<RefCell<Node>>;

/// One node of the composed tree: a resolved tag, the mark where the node
/// started, and the node's shape.
#[derive(Debug)]
pub struct Node {
    pub tag: Tag,
    pub mark: Mark,
    pub kind: NodeKind,
}

/// The three node shapes.
#[derive(Debug)]
pub enum NodeKind {
    Scalar {
        value: String,
        style: ScalarStyle,
    },
    Sequence(Vec<NodeRef>),
    /// Key/value pairs in document order.
    Mapping(Vec<(NodeRef, NodeRef)>),
}

impl Node {
    pub(crate) fn scalar(tag: Tag, value: String, style: ScalarStyle, mark: Mark) -> NodeRef {
        Rc::new(RefCell::new(Node {
            tag,
            mark,
            kind: NodeKind::Scalar { value, style },
        }))
    }

    pub(crate) fn sequence(tag: Tag, mark: Mark) -> NodeRef {
        Rc::new(RefCell::new(Node {
            tag,
            mark,
            kind: NodeKind::Sequence(Vec::new()),
        }))
    }

    pub(crate) fn mapping(tag: Tag, mark: Mark) -> NodeRef {
        Rc::new(RefCell::new(Node {
            tag,
            mark,
            kind: NodeKind::Mapping(Vec::new()),
        }))
    }
}

/// Stable identity of a node, used to key the constructor's caches.
#[inline]
pub(crate) fn node_id(node: &NodeRef) -> usize {
    Rc::as_ptr(node) as usize
}
