//! Composition: from the scanner's token stream to node trees.
//!
//! One document at a time: directives are collected, the document's root
//! node is composed recursively, and per-document state (anchors, tag
//! handles, the `%YAML` version) is dropped at the document boundary.
//!
//! Anchors are registered *before* the anchored node's children are
//! composed, so an alias inside a collection may legitimately point at the
//! collection itself; the constructor deals with the resulting cycle.

use ahash::AHashMap;

use crate::error::Error;
use crate::mark::Mark;
use crate::node::{Node, NodeKind, NodeRef};
use crate::resolve::{resolve_plain, Tag};
use crate::scanner::Scanner;
use crate::token::{ScalarStyle, Token, TokenId, TokenKind};

/// Explicit tag information attached to a node, before kind-based defaults
/// are applied.
enum TagProperty {
    /// No tag written; plain scalars go through the implicit resolver.
    None,
    /// The non-specific `!`: the default tag for the node's kind.
    NonSpecific,
    Explicit(Tag),
}

/// Builds node trees from tokens. See the module docs.
pub struct Composer {
    scanner: Scanner,
    stream_started: bool,
    /// Anchor name -> node, per document.
    anchors: AHashMap<String, NodeRef>,
    /// `%TAG` handle -> prefix, per document.
    tag_handles: AHashMap<String, String>,
    yaml_version: Option<(u32, u32)>,
}

impl Composer {
    pub fn new(scanner: Scanner) -> Self {
        Self {
            scanner,
            stream_started: false,
            anchors: AHashMap::new(),
            tag_handles: AHashMap::new(),
            yaml_version: None,
        }
    }

    /// Compose over an input string directly.
    pub fn from_str(input: &str) -> Self {
        Self::new(Scanner::new(input))
    }

    /// Whether another document remains in the stream.
    pub fn check_node(&mut self) -> Result<bool, Error> {
        self.ensure_stream_start()?;
        while self.peek_id()? == TokenId::DocumentEnd {
            self.take()?;
        }
        Ok(self.peek_id()? != TokenId::StreamEnd)
    }

    /// Compose and return the next document's root node, or `None` once
    /// the stream is exhausted.
    pub fn next_node(&mut self) -> Result<Option<NodeRef>, Error> {
        self.ensure_stream_start()?;
        while self.peek_id()? == TokenId::DocumentEnd {
            self.take()?;
        }

        let saw_directives = self.process_directives()?;
        let explicit_start = if self.peek_id()? == TokenId::DocumentStart {
            self.take()?;
            true
        } else {
            if saw_directives {
                let token = self.take()?;
                return Err(Error::compose(
                    "expected '<document start>' after directives",
                    token.start,
                ));
            }
            false
        };

        if !explicit_start && self.peek_id()? == TokenId::StreamEnd {
            return Ok(None);
        }

        let node = if self.at_document_boundary()? {
            // An explicit `---` with no content is an empty document.
            let mark = self.peek_mark()?;
            Node::scalar(Tag::Null, String::new(), ScalarStyle::Plain, mark)
        } else {
            self.compose_node()?
        };

        while self.peek_id()? == TokenId::DocumentEnd {
            self.take()?;
        }

        self.anchors.clear();
        self.tag_handles.clear();
        self.yaml_version = None;
        Ok(Some(node))
    }

    /// Compose the only document of the stream; a second document is an
    /// error. An empty stream returns `None`.
    pub fn single_node(&mut self) -> Result<Option<NodeRef>, Error> {
        let first = self.next_node()?;
        if first.is_some() && self.check_node()? {
            let mark = self.peek_mark()?;
            return Err(Error::compose(
                "but found another document",
                mark,
            )
            .with_context("expecting a single document in the stream", mark));
        }
        Ok(first)
    }

    // ----- stream plumbing -----

    fn ensure_stream_start(&mut self) -> Result<(), Error> {
        if !self.stream_started {
            let token = self.take()?;
            debug_assert!(matches!(token.kind, TokenKind::StreamStart));
            self.stream_started = true;
        }
        Ok(())
    }

    fn take(&mut self) -> Result<Token, Error> {
        self.scanner.next_token()?.ok_or_else(|| {
            Error::compose("unexpected end of the token stream", Mark::default())
        })
    }

    fn peek_id(&mut self) -> Result<TokenId, Error> {
        Ok(self
            .scanner
            .peek_token()?
            .map(Token::id)
            .unwrap_or(TokenId::StreamEnd))
    }

    fn peek_mark(&mut self) -> Result<Mark, Error> {
        Ok(self
            .scanner
            .peek_token()?
            .map(|token| token.start)
            .unwrap_or_default())
    }

    fn at_document_boundary(&mut self) -> Result<bool, Error> {
        Ok(matches!(
            self.peek_id()?,
            TokenId::DocumentStart
                | TokenId::DocumentEnd
                | TokenId::StreamEnd
                | TokenId::VersionDirective
                | TokenId::TagDirective
                | TokenId::ReservedDirective
        ))
    }

    // ----- directives -----

    fn process_directives(&mut self) -> Result<bool, Error> {
        let mut saw = false;
        loop {
            match self.peek_id()? {
                TokenId::VersionDirective => {
                    let token = self.take()?;
                    let TokenKind::VersionDirective { major, minor } = token.kind else {
                        unreachable!()
                    };
                    if self.yaml_version.is_some() {
                        return Err(Error::compose("found duplicate YAML directive", token.start));
                    }
                    if major != 1 {
                        return Err(Error::compose(
                            format!(
                                "found incompatible YAML document (version 1.* is required, \
                                 got {major}.{minor})"
                            ),
                            token.start,
                        ));
                    }
                    self.yaml_version = Some((major, minor));
                    saw = true;
                }
                TokenId::TagDirective => {
                    let token = self.take()?;
                    let TokenKind::TagDirective { handle, prefix } = token.kind else {
                        unreachable!()
                    };
                    if self.tag_handles.contains_key(&handle) {
                        return Err(Error::compose(
                            format!("duplicate tag handle {handle:?}"),
                            token.start,
                        ));
                    }
                    self.tag_handles.insert(handle, prefix);
                    saw = true;
                }
                TokenId::ReservedDirective => {
                    // Scanned and dropped.
                    self.take()?;
                    saw = true;
                }
                _ => return Ok(saw),
            }
        }
    }

    // ----- nodes -----

    fn compose_node(&mut self) -> Result<NodeRef, Error> {
        if self.peek_id()? == TokenId::Alias {
            let token = self.take()?;
            let TokenKind::Alias { name } = token.kind else {
                unreachable!()
            };
            return self.anchors.get(&name).cloned().ok_or_else(|| {
                Error::compose(format!("found undefined alias {name:?}"), token.start)
            });
        }

        // Anchor and tag may appear in either order.
        let mut anchor: Option<(String, Mark)> = None;
        let mut tag = TagProperty::None;
        loop {
            match self.peek_id()? {
                TokenId::Anchor if anchor.is_none() => {
                    let token = self.take()?;
                    let TokenKind::Anchor { name } = token.kind else {
                        unreachable!()
                    };
                    if self.anchors.contains_key(&name) {
                        return Err(Error::compose(
                            format!("found duplicate anchor {name:?}"),
                            token.start,
                        ));
                    }
                    anchor = Some((name, token.start));
                }
                TokenId::Tag if matches!(tag, TagProperty::None) => {
                    let token = self.take()?;
                    let TokenKind::Tag { handle, suffix } = token.kind else {
                        unreachable!()
                    };
                    tag = self.resolve_tag_property(handle, suffix, token.start)?;
                }
                _ => break,
            }
        }

        let node = match self.peek_id()? {
            TokenId::Scalar => {
                let token = self.take()?;
                let TokenKind::Scalar { value, style } = token.kind else {
                    unreachable!()
                };
                let resolved = match tag {
                    TagProperty::Explicit(tag) => tag,
                    TagProperty::NonSpecific => Tag::Str,
                    TagProperty::None if style.is_plain() => resolve_plain(&value),
                    TagProperty::None => Tag::Str,
                };
                Node::scalar(resolved, value, style, token.start)
            }
            TokenId::FlowSequenceStart | TokenId::BlockSequenceStart => {
                let block = self.peek_id()? == TokenId::BlockSequenceStart;
                let token = self.take()?;
                let resolved = match tag {
                    TagProperty::Explicit(tag) => tag,
                    _ => Tag::Seq,
                };
                let node = Node::sequence(resolved, token.start);
                self.register_anchor(&mut anchor, &node);
                let items = if block {
                    self.compose_block_sequence(token.start)?
                } else {
                    self.compose_flow_sequence(token.start)?
                };
                node.borrow_mut().kind = NodeKind::Sequence(items);
                node
            }
            TokenId::FlowMappingStart | TokenId::BlockMappingStart => {
                let block = self.peek_id()? == TokenId::BlockMappingStart;
                let token = self.take()?;
                let resolved = match tag {
                    TagProperty::Explicit(tag) => tag,
                    _ => Tag::Map,
                };
                let node = Node::mapping(resolved, token.start);
                self.register_anchor(&mut anchor, &node);
                let pairs = if block {
                    self.compose_block_mapping(token.start)?
                } else {
                    self.compose_flow_mapping(token.start)?
                };
                node.borrow_mut().kind = NodeKind::Mapping(pairs);
                node
            }
            _ => {
                // No node content here: an empty scalar, e.g. the missing
                // value of `a:` or the missing key of `: v`.
                let mark = self.peek_mark()?;
                let resolved = match tag {
                    TagProperty::Explicit(tag) => tag,
                    TagProperty::NonSpecific => Tag::Str,
                    TagProperty::None => Tag::Null,
                };
                Node::scalar(resolved, String::new(), ScalarStyle::Plain, mark)
            }
        };

        self.register_anchor(&mut anchor, &node);
        Ok(node)
    }

    fn register_anchor(&mut self, anchor: &mut Option<(String, Mark)>, node: &NodeRef) {
        if let Some((name, _)) = anchor.take() {
            self.anchors.insert(name, node.clone());
        }
    }

    fn null_node(&mut self) -> Result<NodeRef, Error> {
        let mark = self.peek_mark()?;
        Ok(Node::scalar(
            Tag::Null,
            String::new(),
            ScalarStyle::Plain,
            mark,
        ))
    }

    fn compose_block_sequence(&mut self, start: Mark) -> Result<Vec<NodeRef>, Error> {
        let mut items = Vec::new();
        loop {
            match self.peek_id()? {
                TokenId::BlockEntry => {
                    self.take()?;
                    if matches!(self.peek_id()?, TokenId::BlockEntry | TokenId::BlockEnd) {
                        let null = self.null_node()?;
                        items.push(null);
                    } else {
                        items.push(self.compose_node()?);
                    }
                }
                TokenId::BlockEnd => {
                    self.take()?;
                    return Ok(items);
                }
                _ => {
                    let mark = self.peek_mark()?;
                    return Err(Error::compose(
                        format!("expected <block end>, but found {:?}", self.peek_id()?),
                        mark,
                    )
                    .with_context("composing a block sequence", start));
                }
            }
        }
    }

    fn compose_block_mapping(&mut self, start: Mark) -> Result<Vec<(NodeRef, NodeRef)>, Error> {
        let mut pairs = Vec::new();
        loop {
            match self.peek_id()? {
                TokenId::Key => {
                    self.take()?;
                    let key = if matches!(
                        self.peek_id()?,
                        TokenId::Key | TokenId::Value | TokenId::BlockEnd
                    ) {
                        self.null_node()?
                    } else {
                        self.compose_node()?
                    };
                    let value = if self.peek_id()? == TokenId::Value {
                        self.take()?;
                        if matches!(self.peek_id()?, TokenId::Key | TokenId::BlockEnd) {
                            self.null_node()?
                        } else {
                            self.compose_node()?
                        }
                    } else {
                        self.null_node()?
                    };
                    pairs.push((key, value));
                }
                TokenId::BlockEnd => {
                    self.take()?;
                    return Ok(pairs);
                }
                _ => {
                    let mark = self.peek_mark()?;
                    return Err(Error::compose(
                        format!("expected <block end>, but found {:?}", self.peek_id()?),
                        mark,
                    )
                    .with_context("composing a block mapping", start));
                }
            }
        }
    }

    fn compose_flow_sequence(&mut self, start: Mark) -> Result<Vec<NodeRef>, Error> {
        let mut items = Vec::new();
        loop {
            if self.peek_id()? == TokenId::FlowSequenceEnd {
                self.take()?;
                return Ok(items);
            }
            if self.peek_id()? == TokenId::Key {
                // A single-pair mapping inside a flow sequence: [a: b].
                self.take()?;
                let key = if self.peek_id()? == TokenId::Value {
                    self.null_node()?
                } else {
                    self.compose_node()?
                };
                let value = if self.peek_id()? == TokenId::Value {
                    self.take()?;
                    if matches!(
                        self.peek_id()?,
                        TokenId::FlowEntry | TokenId::FlowSequenceEnd
                    ) {
                        self.null_node()?
                    } else {
                        self.compose_node()?
                    }
                } else {
                    self.null_node()?
                };
                let pair_mark = key.borrow().mark;
                let node = Node::mapping(Tag::Map, pair_mark);
                node.borrow_mut().kind = NodeKind::Mapping(vec![(key, value)]);
                items.push(node);
            } else {
                items.push(self.compose_node()?);
            }
            match self.peek_id()? {
                TokenId::FlowEntry => {
                    self.take()?;
                }
                TokenId::FlowSequenceEnd => {
                    self.take()?;
                    return Ok(items);
                }
                other => {
                    let mark = self.peek_mark()?;
                    return Err(Error::compose(
                        format!("expected ',' or ']', but found {other:?}"),
                        mark,
                    )
                    .with_context("composing a flow sequence", start));
                }
            }
        }
    }

    fn compose_flow_mapping(&mut self, start: Mark) -> Result<Vec<(NodeRef, NodeRef)>, Error> {
        let mut pairs = Vec::new();
        loop {
            if self.peek_id()? == TokenId::FlowMappingEnd {
                self.take()?;
                return Ok(pairs);
            }
            let (key, value);
            if self.peek_id()? == TokenId::Key {
                self.take()?;
                key = if matches!(
                    self.peek_id()?,
                    TokenId::Value | TokenId::FlowEntry | TokenId::FlowMappingEnd
                ) {
                    self.null_node()?
                } else {
                    self.compose_node()?
                };
                value = if self.peek_id()? == TokenId::Value {
                    self.take()?;
                    if matches!(
                        self.peek_id()?,
                        TokenId::FlowEntry | TokenId::FlowMappingEnd
                    ) {
                        self.null_node()?
                    } else {
                        self.compose_node()?
                    }
                } else {
                    self.null_node()?
                };
            } else {
                // A bare node is a key with an empty value: {a}.
                key = self.compose_node()?;
                value = self.null_node()?;
            }
            pairs.push((key, value));
            match self.peek_id()? {
                TokenId::FlowEntry => {
                    self.take()?;
                }
                TokenId::FlowMappingEnd => {
                    self.take()?;
                    return Ok(pairs);
                }
                other => {
                    let mark = self.peek_mark()?;
                    return Err(Error::compose(
                        format!("expected ',' or '}}', but found {other:?}"),
                        mark,
                    )
                    .with_context("composing a flow mapping", start));
                }
            }
        }
    }

    // ----- tags -----

    fn resolve_tag_property(
        &self,
        handle: Option<String>,
        suffix: String,
        mark: Mark,
    ) -> Result<TagProperty, Error> {
        let Some(handle) = handle else {
            // Verbatim !<uri>, or the bare non-specific "!".
            if suffix == "!" {
                return Ok(TagProperty::NonSpecific);
            }
            return Ok(TagProperty::Explicit(Tag::from_uri(&suffix)));
        };
        let prefix = match self.tag_handles.get(&handle) {
            Some(prefix) => prefix.as_str(),
            None => match handle.as_str() {
                "!" => "!",
                "!!" => "tag:yaml.org,2002:",
                _ => {
                    return Err(Error::compose(
                        format!("found undefined tag handle {handle:?}"),
                        mark,
                    ));
                }
            },
        };
        Ok(TagProperty::Explicit(Tag::from_uri(&format!(
            "{prefix}{suffix}"
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose(input: &str) -> NodeRef {
        Composer::from_str(input).single_node().unwrap().unwrap()
    }

    #[test]
    fn scalar_tags_resolve_per_style() {
        let node = compose("42");
        assert_eq!(node.borrow().tag, Tag::Int);
        let node = compose("'42'");
        assert_eq!(node.borrow().tag, Tag::Str);
        let node = compose("!!str 42");
        assert_eq!(node.borrow().tag, Tag::Str);
    }

    #[test]
    fn alias_shares_the_node() {
        let node = compose("a: &x [1]\nb: *x\n");
        let node = node.borrow();
        let NodeKind::Mapping(pairs) = &node.kind else {
            panic!("expected a mapping")
        };
        assert!(std::rc::Rc::ptr_eq(&pairs[0].1, &pairs[1].1));
    }

    #[test]
    fn undefined_alias_is_an_error() {
        let err = Composer::from_str("a: *nope\n").single_node().unwrap_err();
        assert!(err.to_string().contains("undefined alias"), "{err}");
    }

    #[test]
    fn duplicate_anchor_is_an_error() {
        let err = Composer::from_str("a: &x 1\nb: &x 2\n")
            .single_node()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate anchor"), "{err}");
    }

    #[test]
    fn second_document_is_an_error_for_single_node() {
        let err = Composer::from_str("a: 1\n---\nb: 2\n")
            .single_node()
            .unwrap_err();
        assert!(err.to_string().contains("single document"), "{err}");
    }

    #[test]
    fn multiple_documents_compose_in_order() {
        let mut composer = Composer::from_str("---\n1\n---\n2\n...\n");
        let first = composer.next_node().unwrap().unwrap();
        assert!(matches!(
            &first.borrow().kind,
            NodeKind::Scalar { value, .. } if value == "1"
        ));
        let second = composer.next_node().unwrap().unwrap();
        assert!(matches!(
            &second.borrow().kind,
            NodeKind::Scalar { value, .. } if value == "2"
        ));
        assert!(composer.next_node().unwrap().is_none());
    }

    #[test]
    fn incompatible_version_is_an_error() {
        let err = Composer::from_str("%YAML 2.0\n---\nx\n")
            .single_node()
            .unwrap_err();
        assert!(err.to_string().contains("incompatible"), "{err}");
    }

    #[test]
    fn tag_directive_prefixes_apply() {
        let node = compose("%TAG !e! tag:yaml.org,2002:\n---\n!e!int 5\n");
        assert_eq!(node.borrow().tag, Tag::Int);
    }

    #[test]
    fn anchors_do_not_leak_between_documents() {
        let mut composer = Composer::from_str("&x 1\n---\n*x\n");
        composer.next_node().unwrap();
        let err = composer.next_node().unwrap_err();
        assert!(err.to_string().contains("undefined alias"), "{err}");
    }
}
