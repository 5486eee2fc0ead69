//! Metadata graph: the side-structure that carries debug information.
//!
//! Two node shapes live in the same arena:
//!
//! - **Tuples** (`!{i32 786478, !3, null, ...}`): ordered generic operands.
//!   The legacy (NVVM) schema is built entirely from these.
//! - **Debug nodes** (`!DISubprogram(name: "f", line: 3, ...)`): a kind plus
//!   named fields. The modern schema uses these.
//!
//! Both are uniqued structurally unless created `distinct`, the same way the
//! native backend uniques metadata. Growable lists ([`ListId`]) are the one
//! exception: they are mutable after creation and are resolved to their
//! current content only when the module is printed.

use rustc_hash::FxHashMap;

use crate::ir::{FunctionId, InstrId};

// ── ID newtypes ─────────────────────────────────────────────────────

/// Metadata node ID within a module's metadata arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct MetadataId(u32);

impl MetadataId {
    /// Create a new metadata ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Growable node list ID.
///
/// A list can be embedded in a tuple before its elements exist; the tuple
/// holds the handle, not a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ListId(u32);

impl ListId {
    /// Create a new list ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Operands ────────────────────────────────────────────────────────

/// One operand of a generic metadata tuple.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MdOperand {
    /// Integer constant of the given bit width (`i32 4`, `i1 true`).
    Int { bits: u32, value: i64 },
    /// Metadata string (`!"Dwarf Version"`).
    Str(String),
    /// Reference to another node in the arena.
    Node(MetadataId),
    /// Empty operand slot (`null`).
    Null,
    /// Reference to a function value (`void ()* @f`).
    Function(FunctionId),
    /// Late-bound reference to a growable list.
    List(ListId),
}

impl MdOperand {
    /// 32-bit integer constant.
    #[inline]
    pub fn i32(value: i64) -> Self {
        Self::Int { bits: 32, value }
    }

    /// 64-bit integer constant.
    #[inline]
    pub fn i64(value: i64) -> Self {
        Self::Int { bits: 64, value }
    }

    /// Boolean constant (`i1`).
    #[inline]
    pub fn bool(value: bool) -> Self {
        Self::Int {
            bits: 1,
            value: i64::from(value),
        }
    }

    /// Metadata string.
    #[inline]
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }
}

// ── Debug nodes ─────────────────────────────────────────────────────

/// Kind of a specialized debug node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiKind {
    File,
    CompileUnit,
    Subprogram,
    SubroutineType,
    Location,
}

impl DiKind {
    /// The node name as written in textual IR.
    pub fn name(self) -> &'static str {
        match self {
            Self::File => "DIFile",
            Self::CompileUnit => "DICompileUnit",
            Self::Subprogram => "DISubprogram",
            Self::SubroutineType => "DISubroutineType",
            Self::Location => "DILocation",
        }
    }
}

/// Value of a named field in a debug node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiValue {
    Int(i64),
    Bool(bool),
    Str(String),
    /// Bare enumerator such as `DW_LANG_C`.
    Token(&'static str),
    Node(MetadataId),
}

/// A specialized debug node: kind plus ordered named fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DiNode {
    pub kind: DiKind,
    pub fields: Vec<(&'static str, DiValue)>,
}

impl DiNode {
    /// Start a node of the given kind with no fields.
    pub fn new(kind: DiKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
        }
    }

    /// Append a field.
    #[must_use]
    pub fn field(mut self, name: &'static str, value: DiValue) -> Self {
        self.fields.push((name, value));
        self
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&DiValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }
}

/// An entry in the metadata arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Metadata {
    Tuple(Vec<MdOperand>),
    Debug { node: DiNode, distinct: bool },
}

impl Metadata {
    /// Tuple operands, if this is a tuple.
    pub fn as_tuple(&self) -> Option<&[MdOperand]> {
        match self {
            Self::Tuple(operands) => Some(operands),
            Self::Debug { .. } => None,
        }
    }

    /// Debug node, if this is one.
    pub fn as_debug(&self) -> Option<&DiNode> {
        match self {
            Self::Debug { node, .. } => Some(node),
            Self::Tuple(_) => None,
        }
    }
}

// ── Sink trait ──────────────────────────────────────────────────────

/// The native module's view of its debug-metadata graph.
///
/// Every debug-info builder constructs its nodes through this trait. The
/// in-memory [`Module`](crate::ir::Module) is the implementation used by the
/// JIT and the tests.
pub trait MetadataSink {
    /// Create (or reuse) a generic tuple node.
    fn add_metadata(&mut self, operands: Vec<MdOperand>) -> MetadataId;

    /// Create a debug node. Non-distinct nodes are uniqued.
    fn add_debug_info(&mut self, node: DiNode, distinct: bool) -> MetadataId;

    /// Look up a node.
    fn metadata(&self, id: MetadataId) -> &Metadata;

    /// Create an empty growable list.
    fn new_list(&mut self) -> ListId;

    /// Append a node to a growable list.
    fn push_to_list(&mut self, list: ListId, node: MetadataId);

    /// Current content of a growable list.
    fn list(&self, list: ListId) -> &[MetadataId];

    /// Append a node to a named top-level list, creating it if needed.
    fn add_named_metadata(&mut self, name: &str, node: MetadataId);

    /// Operands of a named top-level list (empty if it does not exist).
    fn named_metadata(&self, name: &str) -> &[MetadataId];

    /// Attach `node` to a function under `key`, replacing any previous one.
    fn set_function_metadata(&mut self, function: FunctionId, key: &str, node: MetadataId);

    /// Attach `node` to an instruction under `key`, replacing any previous one.
    fn set_instruction_metadata(&mut self, instr: InstrId, key: &str, node: MetadataId);

    /// Find a function by its linkage name.
    fn get_function(&self, name: &str) -> Option<FunctionId>;

    /// Linkage name of a function.
    fn function_name(&self, function: FunctionId) -> &str;
}

// ── Graph storage ───────────────────────────────────────────────────

/// A named top-level metadata list (`!llvm.dbg.cu = !{!1}`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedMetadata {
    pub name: String,
    pub operands: Vec<MetadataId>,
}

/// Arena-backed metadata graph with structural uniquing.
#[derive(Debug, Default)]
pub struct MetadataGraph {
    nodes: Vec<Metadata>,
    lists: Vec<Vec<MetadataId>>,
    named: Vec<NamedMetadata>,
    named_index: FxHashMap<String, usize>,
    tuple_cache: FxHashMap<Vec<MdOperand>, MetadataId>,
    debug_cache: FxHashMap<DiNode, MetadataId>,
}

impl MetadataGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, metadata: Metadata) -> MetadataId {
        let id = MetadataId::new(self.nodes.len() as u32);
        self.nodes.push(metadata);
        id
    }

    /// Create (or reuse) a tuple node.
    pub fn add_tuple(&mut self, operands: Vec<MdOperand>) -> MetadataId {
        if let Some(&id) = self.tuple_cache.get(&operands) {
            return id;
        }
        let id = self.push(Metadata::Tuple(operands.clone()));
        self.tuple_cache.insert(operands, id);
        id
    }

    /// Create a debug node; non-distinct nodes are uniqued.
    pub fn add_debug(&mut self, node: DiNode, distinct: bool) -> MetadataId {
        if distinct {
            return self.push(Metadata::Debug { node, distinct });
        }
        if let Some(&id) = self.debug_cache.get(&node) {
            return id;
        }
        let id = self.push(Metadata::Debug {
            node: node.clone(),
            distinct,
        });
        self.debug_cache.insert(node, id);
        id
    }

    /// Look up a node.
    pub fn get(&self, id: MetadataId) -> &Metadata {
        &self.nodes[id.index()]
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> &[Metadata] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn new_list(&mut self) -> ListId {
        let id = ListId::new(self.lists.len() as u32);
        self.lists.push(Vec::new());
        id
    }

    pub fn push_to_list(&mut self, list: ListId, node: MetadataId) {
        self.lists[list.index()].push(node);
    }

    pub fn list(&self, list: ListId) -> &[MetadataId] {
        &self.lists[list.index()]
    }

    /// All growable lists in creation order.
    pub fn lists(&self) -> &[Vec<MetadataId>] {
        &self.lists
    }

    pub fn add_named(&mut self, name: &str, node: MetadataId) {
        if let Some(&index) = self.named_index.get(name) {
            self.named[index].operands.push(node);
            return;
        }
        self.named_index.insert(name.to_owned(), self.named.len());
        self.named.push(NamedMetadata {
            name: name.to_owned(),
            operands: vec![node],
        });
    }

    pub fn named(&self, name: &str) -> &[MetadataId] {
        self.named_index
            .get(name)
            .map_or(&[], |&index| self.named[index].operands.as_slice())
    }

    /// All named lists in declaration order.
    pub fn named_lists(&self) -> &[NamedMetadata] {
        &self.named
    }
}

#[cfg(test)]
mod tests;
