//! In-memory IR module, the object model the debug-info builders write into.
//!
//! This is a deliberately small slice of LLVM IR: functions made of basic
//! blocks, call/return instructions (including inline-asm calls), and the
//! metadata graph from [`crate::metadata`]. It implements
//! [`MetadataSink`] so the builders can be driven and inspected without a
//! native backend; its `Display` impl prints textual IR for the backend.
//!
//! # Architecture
//!
//! - **[`Module`]**: owns functions, blocks, instructions and metadata
//! - **[`IrBuilder`]**: emission cursor positioned at the end of a block,
//!   carrying the current debug location
//!
//! Functions, blocks and instructions live in module-level arenas and are
//! referenced by [`FunctionId`], [`BlockId`] and [`InstrId`].

use std::fmt;

use rustc_hash::FxHashMap;

use crate::metadata::{
    DiNode, ListId, MdOperand, Metadata, MetadataGraph, MetadataId, MetadataSink,
};

// ── ID newtypes ─────────────────────────────────────────────────────

/// Function ID within a [`Module`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FunctionId(u32);

impl FunctionId {
    /// Create a new function ID from a raw index.
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

/// Basic block ID within a [`Module`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Instruction ID within a [`Module`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct InstrId(u32);

impl InstrId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Types ───────────────────────────────────────────────────────────

/// First-class IR types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IrType {
    Void,
    I1,
    I8,
    I32,
    I64,
    F64,
    Ptr,
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Void => "void",
            Self::I1 => "i1",
            Self::I8 => "i8",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F64 => "double",
            Self::Ptr => "ptr",
        };
        f.write_str(name)
    }
}

/// Function signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FnType {
    pub ret: IrType,
    pub params: Vec<IrType>,
}

impl FnType {
    pub fn new(ret: IrType, params: Vec<IrType>) -> Self {
        Self { ret, params }
    }

    /// `void ()`
    pub fn void() -> Self {
        Self::new(IrType::Void, Vec::new())
    }
}

impl fmt::Display for FnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.ret)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

// ── Values and instructions ─────────────────────────────────────────

/// An instruction operand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    ConstInt { ty: IrType, value: i64 },
    /// Result of a non-void call.
    Instr(InstrId),
}

/// An inline machine-code fragment (`asm sideeffect "...", ""`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineAsm {
    pub ty: FnType,
    pub text: String,
    pub constraints: String,
    /// Observable side effects; the optimizer must not delete the call.
    pub side_effect: bool,
}

impl InlineAsm {
    pub fn new(
        ty: FnType,
        text: impl Into<String>,
        constraints: impl Into<String>,
        side_effect: bool,
    ) -> Self {
        Self {
            ty,
            text: text.into(),
            constraints: constraints.into(),
            side_effect,
        }
    }
}

/// Call target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Callee {
    Function(FunctionId),
    InlineAsm(InlineAsm),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstrKind {
    Call { callee: Callee, args: Vec<Value> },
    Ret(Option<Value>),
}

/// A single instruction with its debug location and metadata attachments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub kind: InstrKind,
    pub block: BlockId,
    /// Standard `!dbg` slot.
    pub debug_location: Option<MetadataId>,
    /// Other attachments, keyed by metadata kind name.
    pub metadata: Vec<(String, MetadataId)>,
}

impl Instruction {
    /// Attachment under `key`, if any.
    pub fn get_metadata(&self, key: &str) -> Option<MetadataId> {
        lookup(&self.metadata, key)
    }

    /// Whether this is a call to an inline-asm fragment.
    pub fn is_inline_asm_call(&self) -> bool {
        matches!(
            self.kind,
            InstrKind::Call {
                callee: Callee::InlineAsm(_),
                ..
            }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub label: String,
    pub function: FunctionId,
    pub instrs: Vec<InstrId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub ty: FnType,
    pub blocks: Vec<BlockId>,
    pub metadata: Vec<(String, MetadataId)>,
}

impl Function {
    /// A function without blocks is a declaration.
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Attachment under `key`, if any.
    pub fn get_metadata(&self, key: &str) -> Option<MetadataId> {
        lookup(&self.metadata, key)
    }
}

fn lookup(attachments: &[(String, MetadataId)], key: &str) -> Option<MetadataId> {
    attachments
        .iter()
        .find(|(name, _)| name == key)
        .map(|&(_, id)| id)
}

fn attach(attachments: &mut Vec<(String, MetadataId)>, key: &str, node: MetadataId) {
    if let Some(slot) = attachments.iter_mut().find(|(name, _)| name == key) {
        slot.1 = node;
    } else {
        attachments.push((key.to_owned(), node));
    }
}

/// Errors from module construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IrError {
    #[error("function '{0}' is already defined in this module")]
    DuplicateFunction(String),
}

// ── Module ──────────────────────────────────────────────────────────

/// An IR module: functions plus the debug-metadata graph.
#[derive(Debug, Default)]
pub struct Module {
    name: String,
    source_filename: Option<String>,
    functions: Vec<Function>,
    function_index: FxHashMap<String, FunctionId>,
    blocks: Vec<Block>,
    instructions: Vec<Instruction>,
    graph: MetadataGraph,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_filename(&self) -> Option<&str> {
        self.source_filename.as_deref()
    }

    pub fn set_source_filename(&mut self, filename: impl Into<String>) {
        self.source_filename = Some(filename.into());
    }

    /// Declare a function. It becomes a definition once a block is appended.
    pub fn add_function(&mut self, name: &str, ty: FnType) -> Result<FunctionId, IrError> {
        if self.function_index.contains_key(name) {
            return Err(IrError::DuplicateFunction(name.to_owned()));
        }
        let id = FunctionId::new(self.functions.len() as u32);
        self.functions.push(Function {
            name: name.to_owned(),
            ty,
            blocks: Vec::new(),
            metadata: Vec::new(),
        });
        self.function_index.insert(name.to_owned(), id);
        Ok(id)
    }

    pub fn append_block(&mut self, function: FunctionId, label: &str) -> BlockId {
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(Block {
            label: label.to_owned(),
            function,
            instrs: Vec::new(),
        });
        self.functions[function.index()].blocks.push(id);
        id
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FunctionId::new(i as u32), f))
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub fn instruction(&self, id: InstrId) -> &Instruction {
        &self.instructions[id.index()]
    }

    /// Instructions of a function in block order.
    pub fn function_instructions(
        &self,
        function: FunctionId,
    ) -> impl Iterator<Item = (InstrId, &Instruction)> + '_ {
        self.function(function)
            .blocks
            .iter()
            .flat_map(move |&block| self.block(block).instrs.iter())
            .map(move |&id| (id, self.instruction(id)))
    }

    /// The metadata graph.
    pub fn graph(&self) -> &MetadataGraph {
        &self.graph
    }

    /// Result type of a value.
    pub fn value_type(&self, value: &Value) -> IrType {
        match value {
            Value::ConstInt { ty, .. } => *ty,
            Value::Instr(id) => self.result_type(*id),
        }
    }

    /// Result type of an instruction (`void` for returns).
    pub fn result_type(&self, id: InstrId) -> IrType {
        match &self.instruction(id).kind {
            InstrKind::Call {
                callee: Callee::Function(f),
                ..
            } => self.function(*f).ty.ret,
            InstrKind::Call {
                callee: Callee::InlineAsm(asm),
                ..
            } => asm.ty.ret,
            InstrKind::Ret(_) => IrType::Void,
        }
    }

    fn push_instruction(&mut self, instruction: Instruction) -> InstrId {
        let id = InstrId::new(self.instructions.len() as u32);
        let block = instruction.block;
        self.instructions.push(instruction);
        self.blocks[block.index()].instrs.push(id);
        id
    }
}

impl MetadataSink for Module {
    fn add_metadata(&mut self, operands: Vec<MdOperand>) -> MetadataId {
        self.graph.add_tuple(operands)
    }

    fn add_debug_info(&mut self, node: DiNode, distinct: bool) -> MetadataId {
        self.graph.add_debug(node, distinct)
    }

    fn metadata(&self, id: MetadataId) -> &Metadata {
        self.graph.get(id)
    }

    fn new_list(&mut self) -> ListId {
        self.graph.new_list()
    }

    fn push_to_list(&mut self, list: ListId, node: MetadataId) {
        self.graph.push_to_list(list, node);
    }

    fn list(&self, list: ListId) -> &[MetadataId] {
        self.graph.list(list)
    }

    fn add_named_metadata(&mut self, name: &str, node: MetadataId) {
        self.graph.add_named(name, node);
    }

    fn named_metadata(&self, name: &str) -> &[MetadataId] {
        self.graph.named(name)
    }

    fn set_function_metadata(&mut self, function: FunctionId, key: &str, node: MetadataId) {
        attach(&mut self.functions[function.index()].metadata, key, node);
    }

    fn set_instruction_metadata(&mut self, instr: InstrId, key: &str, node: MetadataId) {
        attach(&mut self.instructions[instr.index()].metadata, key, node);
    }

    fn get_function(&self, name: &str) -> Option<FunctionId> {
        self.function_index.get(name).copied()
    }

    fn function_name(&self, function: FunctionId) -> &str {
        &self.function(function).name
    }
}

// ── Builder ─────────────────────────────────────────────────────────

/// Instruction emission cursor.
///
/// Always positioned at the end of a block. Every instruction it builds
/// inherits the current debug location until the location is changed.
pub struct IrBuilder<'m> {
    module: &'m mut Module,
    block: BlockId,
    debug_location: Option<MetadataId>,
}

impl<'m> IrBuilder<'m> {
    /// Create a builder positioned at the end of `block`.
    pub fn at_end(module: &'m mut Module, block: BlockId) -> Self {
        Self {
            module,
            block,
            debug_location: None,
        }
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        self.block = block;
    }

    pub fn insert_block(&self) -> BlockId {
        self.block
    }

    /// The function being emitted into.
    pub fn function(&self) -> FunctionId {
        self.module.block(self.block).function
    }

    pub fn module(&self) -> &Module {
        &*self.module
    }

    pub fn module_mut(&mut self) -> &mut Module {
        &mut *self.module
    }

    pub fn set_current_debug_location(&mut self, location: MetadataId) {
        self.debug_location = Some(location);
    }

    pub fn unset_current_debug_location(&mut self) {
        self.debug_location = None;
    }

    pub fn current_debug_location(&self) -> Option<MetadataId> {
        self.debug_location
    }

    fn emit(&mut self, kind: InstrKind) -> InstrId {
        self.module.push_instruction(Instruction {
            kind,
            block: self.block,
            debug_location: self.debug_location,
            metadata: Vec::new(),
        })
    }

    /// Call a function in this module.
    pub fn build_call(&mut self, callee: FunctionId, args: Vec<Value>) -> InstrId {
        self.emit(InstrKind::Call {
            callee: Callee::Function(callee),
            args,
        })
    }

    /// Call an inline machine-code fragment.
    pub fn build_inline_asm_call(&mut self, asm: InlineAsm, args: Vec<Value>) -> InstrId {
        self.emit(InstrKind::Call {
            callee: Callee::InlineAsm(asm),
            args,
        })
    }

    pub fn build_ret(&mut self, value: Option<Value>) -> InstrId {
        self.emit(InstrKind::Ret(value))
    }
}
