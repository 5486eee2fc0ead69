//! Textual IR printing.
//!
//! `Display` for [`Module`] produces the assembly the backend parses:
//! function declarations and definitions with their metadata attachments,
//! named metadata, then the numbered metadata nodes.
//!
//! Arena nodes keep their arena index as their number. Growable lists are
//! numbered after the arena, in creation order, and print their content as
//! of the moment the module is printed.

use std::fmt::{self, Write};

use rustc_hash::FxHashMap;

use crate::ir::{
    Callee, Function, FunctionId, InstrId, InstrKind, Instruction, IrType, Module, Value,
};
use crate::metadata::{DiValue, ListId, MdOperand, Metadata, MetadataId};

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name())?;
        if let Some(source) = self.source_filename() {
            writeln!(f, "source_filename = \"{}\"", escape(source))?;
        }

        for (id, function) in self.functions() {
            writeln!(f)?;
            write_function(f, self, id, function)?;
        }

        let graph = self.graph();
        if !graph.named_lists().is_empty() {
            writeln!(f)?;
        }
        for named in graph.named_lists() {
            write!(f, "!{} = !{{", named.name)?;
            write_ids(f, &named.operands)?;
            writeln!(f, "}}")?;
        }

        if !graph.is_empty() || !graph.lists().is_empty() {
            writeln!(f)?;
        }
        for (index, node) in graph.nodes().iter().enumerate() {
            write!(f, "!{index} = ")?;
            write_node(f, self, node)?;
            writeln!(f)?;
        }
        for (index, list) in graph.lists().iter().enumerate() {
            write!(f, "!{} = !{{", graph.len() + index)?;
            write_ids(f, list)?;
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

fn write_function(
    f: &mut fmt::Formatter<'_>,
    module: &Module,
    id: FunctionId,
    function: &Function,
) -> fmt::Result {
    let keyword = if function.is_declaration() {
        "declare"
    } else {
        "define"
    };
    write!(f, "{keyword} {} @{}(", function.ty.ret, function.name)?;
    for (i, param) in function.ty.params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{param}")?;
    }
    f.write_str(")")?;
    for (key, node) in &function.metadata {
        write!(f, " !{key} !{}", node.raw())?;
    }
    if function.is_declaration() {
        return writeln!(f);
    }
    writeln!(f, " {{")?;

    let names = value_names(module, id);
    for (i, &block) in function.blocks.iter().enumerate() {
        let block = module.block(block);
        if i > 0 {
            writeln!(f)?;
        }
        writeln!(f, "{}:", block.label)?;
        for &instr in &block.instrs {
            f.write_str("  ")?;
            write_instruction(f, module, &names, instr, module.instruction(instr))?;
            writeln!(f)?;
        }
    }
    writeln!(f, "}}")
}

/// `%N` numbers for the non-void results of a function. Unnamed
/// parameters take the first numbers.
fn value_names(module: &Module, function: FunctionId) -> FxHashMap<InstrId, usize> {
    let first = module.function(function).ty.params.len();
    module
        .function_instructions(function)
        .filter(|&(id, _)| module.result_type(id) != IrType::Void)
        .enumerate()
        .map(|(n, (id, _))| (id, first + n))
        .collect()
}

fn write_instruction(
    f: &mut fmt::Formatter<'_>,
    module: &Module,
    names: &FxHashMap<InstrId, usize>,
    id: InstrId,
    instr: &Instruction,
) -> fmt::Result {
    match &instr.kind {
        InstrKind::Call { callee, args } => {
            if let Some(n) = names.get(&id) {
                write!(f, "%{n} = ")?;
            }
            write!(f, "call {} ", module.result_type(id))?;
            match callee {
                Callee::Function(target) => write!(f, "@{}", module.function(*target).name)?,
                Callee::InlineAsm(asm) => {
                    let side_effect = if asm.side_effect { " sideeffect" } else { "" };
                    write!(
                        f,
                        "asm{side_effect} \"{}\", \"{}\"",
                        escape(&asm.text),
                        escape(&asm.constraints)
                    )?;
                }
            }
            f.write_str("(")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{} ", module.value_type(arg))?;
                write_value(f, names, arg)?;
            }
            f.write_str(")")?;
        }
        InstrKind::Ret(None) => f.write_str("ret void")?,
        InstrKind::Ret(Some(value)) => {
            write!(f, "ret {} ", module.value_type(value))?;
            write_value(f, names, value)?;
        }
    }
    if let Some(location) = instr.debug_location {
        write!(f, ", !dbg !{}", location.raw())?;
    }
    for (key, node) in &instr.metadata {
        write!(f, ", !{key} !{}", node.raw())?;
    }
    Ok(())
}

fn write_value(
    f: &mut fmt::Formatter<'_>,
    names: &FxHashMap<InstrId, usize>,
    value: &Value,
) -> fmt::Result {
    match value {
        Value::ConstInt { value, .. } => write!(f, "{value}"),
        Value::Instr(id) => match names.get(id) {
            Some(n) => write!(f, "%{n}"),
            None => f.write_str("undef"),
        },
    }
}

fn write_ids(f: &mut fmt::Formatter<'_>, ids: &[MetadataId]) -> fmt::Result {
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "!{}", id.raw())?;
    }
    Ok(())
}

fn write_node(f: &mut fmt::Formatter<'_>, module: &Module, node: &Metadata) -> fmt::Result {
    match node {
        Metadata::Tuple(operands) => {
            f.write_str("!{")?;
            for (i, operand) in operands.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_operand(f, module, operand)?;
            }
            f.write_str("}")
        }
        Metadata::Debug { node, distinct } => {
            if *distinct {
                f.write_str("distinct ")?;
            }
            write!(f, "!{}(", node.kind.name())?;
            for (i, (name, value)) in node.fields.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{name}: ")?;
                match value {
                    DiValue::Int(v) => write!(f, "{v}")?,
                    DiValue::Bool(v) => write!(f, "{v}")?,
                    DiValue::Str(v) => write!(f, "\"{}\"", escape(v))?,
                    DiValue::Token(v) => f.write_str(v)?,
                    DiValue::Node(id) => write!(f, "!{}", id.raw())?,
                }
            }
            f.write_str(")")
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, module: &Module, operand: &MdOperand) -> fmt::Result {
    match operand {
        MdOperand::Int { bits: 1, value } => write!(f, "i1 {}", *value != 0),
        MdOperand::Int { bits, value } => write!(f, "i{bits} {value}"),
        MdOperand::Str(s) => write!(f, "!\"{}\"", escape(s)),
        MdOperand::Node(id) => write!(f, "!{}", id.raw()),
        MdOperand::Null => f.write_str("null"),
        MdOperand::Function(id) => {
            let function = module.function(*id);
            write!(f, "{}* @{}", function.ty, function.name)
        }
        MdOperand::List(list) => write!(f, "!{}", list_number(module, *list)),
    }
}

fn list_number(module: &Module, list: ListId) -> usize {
    module.graph().len() + list.index()
}

/// Escape a string for a quoted IR literal (`\22` for `"`, `\5C` for `\`).
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        if (0x20..=0x7e).contains(&byte) && byte != b'"' && byte != b'\\' {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "\\{byte:02X}");
        }
    }
    out
}
