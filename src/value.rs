//! The generic values the safe constructor is allowed to produce.

use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use crate::timestamp::Timestamp;

/// Shared, mutable sequence contents.
pub type Sequence = Rc<RefCell<Vec<Value>>>;
/// Shared, mutable mapping contents; insertion-ordered.
pub type Mapping = Rc<RefCell<IndexMap<Value, Value>>>;
/// Shared, mutable ordered key/value pair list (`!!omap`, `!!pairs`).
pub type PairList = Rc<RefCell<Vec<(Value, Value)>>>;
/// Shared, mutable set contents; insertion-ordered.
pub type ValueSet = Rc<RefCell<IndexSet<Value>>>;

/// A constructed value: exactly one of the allow-listed shapes.
///
/// Collections hold `Rc` handles, so a value aliased from several places in
/// the document (or from inside itself) is one shared object; cloning a
/// `Value` clones the handle, not the contents.
///
/// `Eq`/`Hash` are structural and only sound for acyclic values; the
/// constructor verifies acyclicity before using any collection as a
/// mapping key or set element. Floats compare by bit pattern, so `NaN`
/// equals `NaN` and keys behave reflexively.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    /// An integer fitting the native width.
    Int(i64),
    /// An integer that only fits the widened precision.
    BigInt(i128),
    Float(f64),
    Str(String),
    /// Decoded `!!binary` contents.
    Binary(Vec<u8>),
    Timestamp(Timestamp),
    Seq(Sequence),
    Map(Mapping),
    /// `!!omap`: ordered entries, duplicates preserved.
    Omap(PairList),
    /// `!!pairs`: ordered entries, duplicates preserved.
    Pairs(PairList),
    Set(ValueSet),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&Sequence> {
        match self {
            Value::Seq(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a string key in a mapping value.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Value::Map(map) => map.borrow().get(&Value::Str(key.to_string())).cloned(),
            _ => None,
        }
    }

    /// The address of the shared contents for collection values; `None`
    /// for scalars. Two values with the same id are the same collection.
    pub fn collection_id(&self) -> Option<usize> {
        match self {
            Value::Seq(c) => Some(Rc::as_ptr(c) as usize),
            Value::Map(c) => Some(Rc::as_ptr(c) as usize),
            Value::Omap(c) | Value::Pairs(c) => Some(Rc::as_ptr(c) as usize),
            Value::Set(c) => Some(Rc::as_ptr(c) as usize),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Map(a), Value::Map(b)) => {
                Rc::ptr_eq(a, b) || {
                    let (a, b) = (a.borrow(), b.borrow());
                    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
                }
            }
            (Value::Omap(a), Value::Omap(b)) | (Value::Pairs(a), Value::Pairs(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Set(a), Value::Set(b)) => {
                Rc::ptr_eq(a, b) || {
                    let (a, b) = (a.borrow(), b.borrow());
                    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
                }
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => state.write_u8(0),
            Value::Bool(b) => {
                state.write_u8(1);
                b.hash(state);
            }
            Value::Int(i) => {
                state.write_u8(2);
                i.hash(state);
            }
            Value::BigInt(i) => {
                state.write_u8(3);
                i.hash(state);
            }
            Value::Float(f) => {
                state.write_u8(4);
                f.to_bits().hash(state);
            }
            Value::Str(s) => {
                state.write_u8(5);
                s.hash(state);
            }
            Value::Binary(b) => {
                state.write_u8(6);
                b.hash(state);
            }
            Value::Timestamp(t) => {
                state.write_u8(7);
                t.hash(state);
            }
            Value::Seq(seq) => {
                state.write_u8(8);
                for item in seq.borrow().iter() {
                    item.hash(state);
                }
            }
            Value::Map(map) => {
                state.write_u8(9);
                for (key, value) in map.borrow().iter() {
                    key.hash(state);
                    value.hash(state);
                }
            }
            Value::Omap(pairs) => {
                state.write_u8(10);
                for (key, value) in pairs.borrow().iter() {
                    key.hash(state);
                    value.hash(state);
                }
            }
            Value::Pairs(pairs) => {
                state.write_u8(11);
                for (key, value) in pairs.borrow().iter() {
                    key.hash(state);
                    value.hash(state);
                }
            }
            Value::Set(set) => {
                state.write_u8(12);
                for item in set.borrow().iter() {
                    item.hash(state);
                }
            }
        }
    }
}

/// Build a fresh, empty shared sequence handle.
pub(crate) fn new_sequence() -> Sequence {
    Rc::new(RefCell::new(Vec::new()))
}

pub(crate) fn new_mapping() -> Mapping {
    Rc::new(RefCell::new(IndexMap::new()))
}

pub(crate) fn new_pair_list() -> PairList {
    Rc::new(RefCell::new(Vec::new()))
}

pub(crate) fn new_set() -> ValueSet {
    Rc::new(RefCell::new(IndexSet::new()))
}
