//! Per-call identity bookkeeping.
//!
//! The generator maps each record's [`Identity`] to an [`ObjectId`] through an
//! [`IdentityTable`]; the parser maps ids back to the records it rebuilt through
//! a [`ReferenceTable`]. Both are owned by a single `generate`/`parse` call and
//! never shared between calls.

use crate::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// The pointer identity of a shared record.
///
/// Only meaningful while the record is alive. An [`IdentityTable`] holds a
/// handle to every record it numbers, so no address is handed to a new record
/// while the table still maps it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Identity(usize);

impl Identity {
    pub(crate) fn of<T: ?Sized>(shared: &Rc<RefCell<T>>) -> Self {
        Identity(Rc::as_ptr(shared).cast::<()>() as usize)
    }
}

/// Sequential id assigned to a record in depth-first visitation order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    pub(crate) fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw numeric value.
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Parses the text form written into `id` attributes and `ref` nodes.
    pub fn parse(text: &str) -> Option<Self> {
        text.trim().parse::<u32>().ok().map(Self)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity → id, built while generating.
///
/// Numbered records are kept alive until [`IdentityTable::clear`], which
/// covers records an encoder builds on the fly and drops right away.
#[derive(Debug, Default)]
pub struct IdentityTable {
    ids: HashMap<Identity, ObjectId>,
    records: Vec<Value>,
    next: u32,
}

impl IdentityTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id already assigned to `identity`, if any.
    #[must_use]
    pub fn lookup(&self, identity: Identity) -> Option<ObjectId> {
        self.ids.get(&identity).copied()
    }

    /// Assigns the next id to `record`. Assigning twice returns the first id.
    ///
    /// Returns `None` for values without identity.
    pub fn assign(&mut self, record: &Value) -> Option<ObjectId> {
        let identity = record.identity()?;
        if let Some(id) = self.lookup(identity) {
            return Some(id);
        }
        let id = ObjectId::new(self.next);
        self.next += 1;
        self.ids.insert(identity, id);
        self.records.push(record.clone());
        Some(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.records.clear();
        self.next = 0;
    }
}

/// Id → rebuilt record, filled while parsing.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    values: HashMap<ObjectId, Value>,
}

impl ReferenceTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the record stored under `id`.
    pub fn register(&mut self, id: ObjectId, value: Value) -> Option<Value> {
        self.values.insert(id, value)
    }

    /// Returns a new handle to the record stored under `id`.
    #[must_use]
    pub fn resolve(&self, id: ObjectId) -> Option<Value> {
        self.values.get(&id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
