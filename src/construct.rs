//! Safe construction: from node trees to generic values.
//!
//! Dispatch is an exhaustive match over the resolved [`Tag`]; `Tag::Other`
//! is refused, which is the allow-list boundary this layer exists for.
//!
//! Cycles are handled with two-phase construction. A collection value is
//! created empty and registered under its node's identity *before* its
//! contents are built, and the contents are queued as an explicit fill job.
//! A child that aliases its own ancestor then finds the registered skeleton
//! and shares it. Construction that re-enters a node while it is still
//! being dispatched (which happens on the deep path used for mapping keys
//! and merge sources) is an unconstructable cycle and fails. Mapping keys
//! are only inserted once their identity can be computed: a key that is
//! still being filled is queued for deferred insertion, and a key that
//! turns out to be self-referential is refused.
//!
//! All per-document state lives in this struct and is cleared after each
//! document; independent parses need independent instances.

use std::collections::VecDeque;
use std::rc::Rc;

use ahash::{AHashMap, AHashSet};

use crate::base64;
use crate::composer::Composer;
use crate::error::Error;
use crate::mark::Mark;
use crate::node::{node_id, NodeKind, NodeRef};
use crate::resolve::Tag;
use crate::scalars::{self, ParsedInt};
use crate::timestamp;
use crate::value::{
    new_mapping, new_pair_list, new_sequence, new_set, Mapping, PairList, Sequence, Value,
    ValueSet,
};

/// A queued unit of work: either the contents of a collection skeleton, or
/// a single deferred key insertion.
enum Fill {
    Sequence {
        target: Sequence,
        node: NodeRef,
    },
    Mapping {
        target: Mapping,
        node: NodeRef,
    },
    Set {
        target: ValueSet,
        node: NodeRef,
    },
    /// `!!omap` / `!!pairs` contents.
    PairList {
        target: PairList,
        node: NodeRef,
        omap: bool,
    },
    MapEntry {
        target: Mapping,
        key: Value,
        value: Value,
        mark: Mark,
    },
    SetEntry {
        target: ValueSet,
        key: Value,
        mark: Mark,
    },
}

impl Fill {
    /// The node whose contents this job fills, if it is a container job.
    fn container_node_id(&self) -> Option<usize> {
        match self {
            Fill::Sequence { node, .. }
            | Fill::Mapping { node, .. }
            | Fill::Set { node, .. }
            | Fill::PairList { node, .. } => Some(node_id(node)),
            Fill::MapEntry { .. } | Fill::SetEntry { .. } => None,
        }
    }
}

/// Walks node trees and produces only the allow-listed value shapes.
pub struct SafeConstructor {
    composer: Composer,
    /// Node identity -> constructed value (possibly a yet-unfilled
    /// skeleton), per document.
    constructed: AHashMap<usize, Value>,
    /// Nodes whose dispatch is on the stack; re-entry is a cycle error.
    in_progress: AHashSet<usize>,
    /// Collection identities (of the value skeletons) whose fill has not
    /// completed yet.
    unfilled: AHashSet<usize>,
    fills: VecDeque<Fill>,
    /// Sticky deep-construction flag: set while building mapping keys and
    /// merge sources, which must be complete before use.
    deep: bool,
}

impl SafeConstructor {
    pub fn new(composer: Composer) -> Self {
        Self {
            composer,
            constructed: AHashMap::new(),
            in_progress: AHashSet::new(),
            unfilled: AHashSet::new(),
            fills: VecDeque::new(),
            deep: false,
        }
    }

    /// Construct over an input string directly.
    pub fn from_str(input: &str) -> Self {
        Self::new(Composer::from_str(input))
    }

    /// Whether another document remains.
    pub fn check_value(&mut self) -> Result<bool, Error> {
        self.composer.check_node()
    }

    /// Construct the next document, or `None` once the stream is done.
    pub fn next_value(&mut self) -> Result<Option<Value>, Error> {
        match self.composer.next_node()? {
            Some(node) => Ok(Some(self.construct_document(node)?)),
            None => Ok(None),
        }
    }

    /// Construct the single document of the stream; a second document is
    /// an error, an empty stream is `Null`.
    pub fn single_value(&mut self) -> Result<Value, Error> {
        match self.composer.single_node()? {
            Some(node) => self.construct_document(node),
            None => Ok(Value::Null),
        }
    }

    /// Build one document and clear the per-document caches.
    fn construct_document(&mut self, root: NodeRef) -> Result<Value, Error> {
        let result = self
            .construct_object(&root, false)
            .and_then(|value| self.drain_fills().map(|()| value));
        self.constructed.clear();
        self.in_progress.clear();
        self.unfilled.clear();
        self.fills.clear();
        self.deep = false;
        result
    }

    fn construct_object(&mut self, node: &NodeRef, deep: bool) -> Result<Value, Error> {
        let id = node_id(node);
        if let Some(value) = self.constructed.get(&id).cloned() {
            if deep {
                // Deep construction needs the contents now, not at drain
                // time (e.g. a merge source whose fill is still queued).
                self.run_pending_fill_for(id)?;
            }
            return Ok(value);
        }
        if self.in_progress.contains(&id) {
            return Err(Error::construct(
                "found unconstructable recursive node",
                node.borrow().mark,
            ));
        }
        self.in_progress.insert(id);
        let prev_deep = self.deep;
        if deep {
            self.deep = true;
        }

        let (value, fill) = self.dispatch(node)?;
        if let Some(fill) = fill {
            if self.deep {
                // Filled in place while the node is still in progress, so
                // a cycle through this path is detected, not deferred.
                self.run_container_fill(fill)?;
                self.constructed.insert(id, value.clone());
            } else {
                self.constructed.insert(id, value.clone());
                self.unfilled
                    .insert(value.collection_id().expect("collections have an id"));
                self.fills.push_back(fill);
            }
        } else {
            self.constructed.insert(id, value.clone());
        }

        self.in_progress.remove(&id);
        self.deep = prev_deep;
        Ok(value)
    }

    /// Tag-dispatched construction. Collections return a skeleton plus the
    /// fill job producing their contents.
    fn dispatch(&mut self, node: &NodeRef) -> Result<(Value, Option<Fill>), Error> {
        let (tag, mark) = {
            let node = node.borrow();
            (node.tag.clone(), node.mark)
        };
        let value = match tag {
            Tag::Null => {
                self.expect_scalar(node, "a null value")?;
                Value::Null
            }
            Tag::Bool => {
                let text = self.expect_scalar(node, "a boolean")?;
                Value::Bool(scalars::parse_bool(&text).map_err(|msg| Error::construct(msg, mark))?)
            }
            Tag::Int => {
                let text = self.expect_scalar(node, "an integer")?;
                match scalars::parse_int(&text).map_err(|msg| Error::construct(msg, mark))? {
                    ParsedInt::Small(small) => Value::Int(small),
                    ParsedInt::Big(big) => Value::BigInt(big),
                }
            }
            Tag::Float => {
                let text = self.expect_scalar(node, "a float")?;
                Value::Float(scalars::parse_float(&text).map_err(|msg| Error::construct(msg, mark))?)
            }
            Tag::Str => Value::Str(self.expect_scalar(node, "a string")?),
            Tag::Binary => {
                let text = self.expect_scalar(node, "binary data")?;
                Value::Binary(base64::decode(&text).map_err(|msg| {
                    Error::construct(msg, mark).with_context("constructing binary data", mark)
                })?)
            }
            Tag::Timestamp => {
                let text = self.expect_scalar(node, "a timestamp")?;
                Value::Timestamp(
                    timestamp::parse_timestamp(&text)
                        .map_err(|msg| Error::construct(msg, mark))?,
                )
            }
            Tag::Seq => {
                self.expect_kind(node, "a sequence", |kind| {
                    matches!(kind, NodeKind::Sequence(_))
                })?;
                let target = new_sequence();
                let fill = Fill::Sequence {
                    target: target.clone(),
                    node: node.clone(),
                };
                return Ok((Value::Seq(target), Some(fill)));
            }
            Tag::Map => {
                self.expect_kind(node, "a mapping", |kind| {
                    matches!(kind, NodeKind::Mapping(_))
                })?;
                let target = new_mapping();
                let fill = Fill::Mapping {
                    target: target.clone(),
                    node: node.clone(),
                };
                return Ok((Value::Map(target), Some(fill)));
            }
            Tag::Set => {
                self.expect_kind(node, "a set", |kind| matches!(kind, NodeKind::Mapping(_)))?;
                let target = new_set();
                let fill = Fill::Set {
                    target: target.clone(),
                    node: node.clone(),
                };
                return Ok((Value::Set(target), Some(fill)));
            }
            Tag::Omap | Tag::Pairs => {
                let omap = tag == Tag::Omap;
                let what = if omap { "an ordered map" } else { "pairs" };
                self.expect_kind(node, what, |kind| matches!(kind, NodeKind::Sequence(_)))?;
                let target = new_pair_list();
                let fill = Fill::PairList {
                    target: target.clone(),
                    node: node.clone(),
                    omap,
                };
                let value = if omap {
                    Value::Omap(target)
                } else {
                    Value::Pairs(target)
                };
                return Ok((value, Some(fill)));
            }
            Tag::Merge => {
                return Err(Error::construct(
                    "found a merge key outside a mapping",
                    mark,
                ));
            }
            Tag::Other(uri) => {
                // The safety boundary: nothing outside the allow-list is
                // ever instantiated.
                return Err(Error::construct(
                    format!("could not determine a constructor for the tag {uri:?}"),
                    mark,
                ));
            }
        };
        Ok((value, None))
    }

    // ----- fills -----

    fn drain_fills(&mut self) -> Result<(), Error> {
        while let Some(fill) = self.fills.pop_front() {
            match fill {
                Fill::MapEntry {
                    target,
                    key,
                    value,
                    mark,
                } => {
                    if !self.key_ready(&key) && self.container_fills_pending() {
                        self.fills.push_back(Fill::MapEntry {
                            target,
                            key,
                            value,
                            mark,
                        });
                        continue;
                    }
                    self.check_key(&key, Rc::as_ptr(&target) as usize, mark)?;
                    target.borrow_mut().insert(key, value);
                }
                Fill::SetEntry { target, key, mark } => {
                    if !self.key_ready(&key) && self.container_fills_pending() {
                        self.fills.push_back(Fill::SetEntry { target, key, mark });
                        continue;
                    }
                    self.check_key(&key, Rc::as_ptr(&target) as usize, mark)?;
                    target.borrow_mut().insert(key);
                }
                other => self.run_container_fill(other)?,
            }
        }
        Ok(())
    }

    fn container_fills_pending(&self) -> bool {
        self.fills.iter().any(|fill| fill.container_node_id().is_some())
    }

    /// Pull a specific node's queued fill forward and run it.
    fn run_pending_fill_for(&mut self, id: usize) -> Result<(), Error> {
        if let Some(position) = self
            .fills
            .iter()
            .position(|fill| fill.container_node_id() == Some(id))
        {
            let fill = self.fills.remove(position).expect("position just found");
            self.run_container_fill(fill)?;
        }
        Ok(())
    }

    fn run_container_fill(&mut self, fill: Fill) -> Result<(), Error> {
        match fill {
            Fill::Sequence { target, node } => {
                let children = match &node.borrow().kind {
                    NodeKind::Sequence(children) => children.clone(),
                    _ => unreachable!("checked at dispatch"),
                };
                for child in &children {
                    let item = self.construct_object(child, self.deep)?;
                    target.borrow_mut().push(item);
                }
                self.unfilled.remove(&(Rc::as_ptr(&target) as usize));
            }
            Fill::Mapping { target, node } => {
                self.fill_mapping(&target, &node)?;
                self.unfilled.remove(&(Rc::as_ptr(&target) as usize));
            }
            Fill::Set { target, node } => {
                self.fill_set(&target, &node)?;
                self.unfilled.remove(&(Rc::as_ptr(&target) as usize));
            }
            Fill::PairList { target, node, omap } => {
                self.fill_pair_list(&target, &node, omap)?;
                self.unfilled.remove(&(Rc::as_ptr(&target) as usize));
            }
            Fill::MapEntry { .. } | Fill::SetEntry { .. } => {
                unreachable!("entry jobs are handled in drain_fills")
            }
        }
        Ok(())
    }

    fn fill_mapping(&mut self, target: &Mapping, node: &NodeRef) -> Result<(), Error> {
        let (own, sources) = self.split_merge(node)?;
        for (key_node, value_node) in &own {
            let key_mark = key_node.borrow().mark;
            let key = self.construct_object(key_node, true)?;
            let value = self.construct_object(value_node, self.deep)?;
            if self.key_ready(&key) {
                self.check_key(&key, Rc::as_ptr(target) as usize, key_mark)?;
                target.borrow_mut().insert(key, value);
            } else {
                // The key's contents are still being built (it aliases a
                // collection whose fill is pending); insert it later.
                self.fills.push_back(Fill::MapEntry {
                    target: target.clone(),
                    key,
                    value,
                    mark: key_mark,
                });
            }
        }
        // Merge sources, in order, fill in only missing keys: a key
        // already present — locally or from an earlier source — wins.
        for source_node in &sources {
            let source_mark = source_node.borrow().mark;
            let source = self.construct_object(source_node, true)?;
            let Value::Map(source_map) = source else {
                return Err(Error::construct(
                    "expected a mapping for merging",
                    source_mark,
                ));
            };
            if Rc::ptr_eq(&source_map, target) {
                return Err(Error::construct(
                    "cannot merge a mapping into itself",
                    source_mark,
                ));
            }
            for (key, value) in source_map.borrow().iter() {
                let mut map = target.borrow_mut();
                if !map.contains_key(key) {
                    map.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    fn fill_set(&mut self, target: &ValueSet, node: &NodeRef) -> Result<(), Error> {
        let (own, sources) = self.split_merge(node)?;
        for (key_node, _value_node) in &own {
            let key_mark = key_node.borrow().mark;
            let key = self.construct_object(key_node, true)?;
            if self.key_ready(&key) {
                self.check_key(&key, Rc::as_ptr(target) as usize, key_mark)?;
                target.borrow_mut().insert(key);
            } else {
                self.fills.push_back(Fill::SetEntry {
                    target: target.clone(),
                    key,
                    mark: key_mark,
                });
            }
        }
        for source_node in &sources {
            let source_mark = source_node.borrow().mark;
            let source = self.construct_object(source_node, true)?;
            let Value::Map(source_map) = source else {
                return Err(Error::construct(
                    "expected a mapping for merging",
                    source_mark,
                ));
            };
            for (key, _value) in source_map.borrow().iter() {
                target.borrow_mut().insert(key.clone());
            }
        }
        Ok(())
    }

    fn fill_pair_list(&mut self, target: &PairList, node: &NodeRef, omap: bool) -> Result<(), Error> {
        let what = if omap { "an ordered map" } else { "pairs" };
        let (children, mark) = match &node.borrow().kind {
            NodeKind::Sequence(children) => (children.clone(), node.borrow().mark),
            _ => unreachable!("checked at dispatch"),
        };
        for child in &children {
            let pair = {
                let child = child.borrow();
                match &child.kind {
                    NodeKind::Mapping(pairs) if pairs.len() == 1 => {
                        (pairs[0].0.clone(), pairs[0].1.clone())
                    }
                    NodeKind::Mapping(_) => {
                        return Err(Error::construct(
                            "expected a single mapping item",
                            child.mark,
                        )
                        .with_context(format!("constructing {what}"), mark));
                    }
                    _ => {
                        return Err(Error::construct(
                            "expected a mapping of length 1",
                            child.mark,
                        )
                        .with_context(format!("constructing {what}"), mark));
                    }
                }
            };
            // Duplicate keys are kept as-is; checking would cost more than
            // the ordered-pair representation is worth.
            let key = self.construct_object(&pair.0, true)?;
            let value = self.construct_object(&pair.1, self.deep)?;
            target.borrow_mut().push((key, value));
        }
        Ok(())
    }

    /// Split a mapping node into its own key/value pairs and the merge
    /// source nodes, in document order. A merge value may be a mapping or
    /// a sequence of mappings.
    #[allow(clippy::type_complexity)]
    fn split_merge(
        &self,
        node: &NodeRef,
    ) -> Result<(Vec<(NodeRef, NodeRef)>, Vec<NodeRef>), Error> {
        let node = node.borrow();
        let NodeKind::Mapping(pairs) = &node.kind else {
            unreachable!("checked at dispatch");
        };
        let mut own = Vec::new();
        let mut sources = Vec::new();
        for (key_node, value_node) in pairs {
            if key_node.borrow().tag != Tag::Merge {
                own.push((key_node.clone(), value_node.clone()));
                continue;
            }
            let value = value_node.borrow();
            match &value.kind {
                NodeKind::Mapping(_) => sources.push(value_node.clone()),
                NodeKind::Sequence(children) => {
                    for child in children {
                        if !matches!(child.borrow().kind, NodeKind::Mapping(_)) {
                            return Err(Error::construct(
                                "expected a mapping for merging",
                                child.borrow().mark,
                            )
                            .with_context("constructing a mapping", node.mark));
                        }
                        sources.push(child.clone());
                    }
                }
                NodeKind::Scalar { .. } => {
                    return Err(Error::construct(
                        "expected a mapping or a list of mappings for merging",
                        value.mark,
                    )
                    .with_context("constructing a mapping", node.mark));
                }
            }
        }
        Ok((own, sources))
    }

    // ----- key safety -----

    /// A key is ready once no collection reachable from it still has a
    /// pending fill.
    fn key_ready(&self, key: &Value) -> bool {
        let mut visited = AHashSet::new();
        let mut stack = vec![key.clone()];
        while let Some(value) = stack.pop() {
            let Some(id) = value.collection_id() else {
                continue;
            };
            if self.unfilled.contains(&id) {
                return false;
            }
            if !visited.insert(id) {
                continue;
            }
            push_children(&value, &mut stack);
        }
        true
    }

    /// Computing a key's identity must terminate: the key may not reach
    /// itself, and may not reach the container it is being inserted into.
    fn check_key(&self, key: &Value, target_id: usize, mark: Mark) -> Result<(), Error> {
        fn walk(
            value: &Value,
            target_id: usize,
            path: &mut Vec<usize>,
            done: &mut AHashSet<usize>,
        ) -> bool {
            let Some(id) = value.collection_id() else {
                return true;
            };
            if id == target_id || path.contains(&id) {
                return false;
            }
            if done.contains(&id) {
                return true;
            }
            path.push(id);
            let mut children = Vec::new();
            push_children(value, &mut children);
            let ok = children
                .iter()
                .all(|child| walk(child, target_id, path, done));
            path.pop();
            done.insert(id);
            ok
        }
        let mut done = AHashSet::new();
        if walk(key, target_id, &mut Vec::new(), &mut done) {
            Ok(())
        } else {
            Err(Error::construct("found an unacceptable recursive key", mark))
        }
    }

    // ----- node shape helpers -----

    fn expect_scalar(&self, node: &NodeRef, what: &'static str) -> Result<String, Error> {
        let node = node.borrow();
        match &node.kind {
            NodeKind::Scalar { value, .. } => Ok(value.clone()),
            _ => Err(Error::construct(
                format!("expected a scalar node while constructing {what}"),
                node.mark,
            )),
        }
    }

    fn expect_kind(
        &self,
        node: &NodeRef,
        what: &'static str,
        matches: impl Fn(&NodeKind) -> bool,
    ) -> Result<(), Error> {
        let node = node.borrow();
        if matches(&node.kind) {
            Ok(())
        } else {
            Err(Error::construct(
                format!("unexpected node shape while constructing {what}"),
                node.mark,
            ))
        }
    }
}

/// Push the immediate child values of a collection onto `stack`.
fn push_children(value: &Value, stack: &mut Vec<Value>) {
    match value {
        Value::Seq(seq) => stack.extend(seq.borrow().iter().cloned()),
        Value::Map(map) => {
            for (key, val) in map.borrow().iter() {
                stack.push(key.clone());
                stack.push(val.clone());
            }
        }
        Value::Omap(pairs) | Value::Pairs(pairs) => {
            for (key, val) in pairs.borrow().iter() {
                stack.push(key.clone());
                stack.push(val.clone());
            }
        }
        Value::Set(set) => stack.extend(set.borrow().iter().cloned()),
        _ => {}
    }
}
