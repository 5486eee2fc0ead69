//! Property-based tests for the debug-info builders.
//!
//! Random sequences of functions and line marks verify:
//! 1. Subprograms are registered in call order for both schemas
//! 2. The modern schema attaches a location to every marked instruction
//! 3. The legacy schema emits one marker per run of equal lines

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::path::Path;

use ori_debuginfo::ir::{BlockId, Callee, InstrKind};
use ori_debuginfo::metadata::DiValue;
use ori_debuginfo::{
    DebugInfoBuilder, DebugInfoConfig, FnType, FunctionId, IrBuilder, LegacyDebugInfo, MdOperand,
    MetadataSink, ModernDebugInfo, Module, SourceLoc,
};
use proptest::prelude::*;

const SOURCE: &str = "/tmp/prop.src";

// -- Strategies --

/// Source lines; a small range so that repeats are common.
fn lines_strategy() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(1u32..6, 0..40)
}

/// Definition lines of a sequence of functions.
fn functions_strategy() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(1u32..500, 1..12)
}

// -- Helpers --

fn define(module: &mut Module, index: usize) -> (FunctionId, BlockId) {
    let func = module
        .add_function(&format!("ori_fn_{index}"), FnType::void())
        .unwrap();
    let entry = module.append_block(func, "entry");
    (func, entry)
}

fn lower_lines(di: &mut dyn DebugInfoBuilder, module: &mut Module, entry: BlockId, lines: &[u32]) {
    let mut builder = IrBuilder::at_end(module, entry);
    for &line in lines {
        di.mark_location(&mut builder, SourceLoc::new(line));
        builder.build_ret(None);
    }
}

/// Number of maximal runs of equal adjacent values.
fn count_runs(lines: &[u32]) -> usize {
    let mut runs = 0;
    let mut previous = None;
    for &line in lines {
        if previous != Some(line) {
            runs += 1;
            previous = Some(line);
        }
    }
    runs
}

fn marker_lines(module: &Module, function: FunctionId) -> Vec<u32> {
    module
        .function_instructions(function)
        .filter_map(|(_, instr)| match &instr.kind {
            InstrKind::Call {
                callee: Callee::InlineAsm(asm),
                ..
            } => asm.text.strip_prefix("// dbg ").map(|n| n.parse().unwrap()),
            _ => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn modern_subprograms_follow_call_order(definition_lines in functions_strategy()) {
        let mut module = Module::new("prop");
        let config = DebugInfoConfig::development();
        let mut di = ModernDebugInfo::new(&mut module, &config, Path::new(SOURCE)).unwrap();

        let mut functions = Vec::new();
        for (index, &line) in definition_lines.iter().enumerate() {
            let (func, _) = define(&mut module, index);
            di.mark_subprogram(&mut module, func, &format!("fn_{index}"), line);
            functions.push(func);
        }
        di.finalize(&mut module);

        prop_assert_eq!(di.subprograms().len(), functions.len());
        for ((&func, &subprogram), &line) in
            functions.iter().zip(di.subprograms()).zip(&definition_lines)
        {
            prop_assert_eq!(module.function(func).get_metadata("dbg"), Some(subprogram));
            let node = module.metadata(subprogram).as_debug().unwrap();
            prop_assert_eq!(node.get("line"), Some(&DiValue::Int(i64::from(line))));
        }
        prop_assert_eq!(di.active_subprogram(), di.subprograms().last().copied());
    }

    #[test]
    fn legacy_subprograms_follow_call_order(definition_lines in functions_strategy()) {
        let mut module = Module::new("prop");
        let config = DebugInfoConfig::development();
        let mut di = LegacyDebugInfo::new(&mut module, &config, Path::new(SOURCE)).unwrap();

        let mut functions = Vec::new();
        for (index, &line) in definition_lines.iter().enumerate() {
            let (func, _) = define(&mut module, index);
            di.mark_subprogram(&mut module, func, &format!("fn_{index}"), line);
            functions.push(func);
        }
        di.finalize(&mut module);

        let subprograms = module.list(di.subprogram_list());
        prop_assert_eq!(subprograms.len(), functions.len());
        for (&func, &subprogram) in functions.iter().zip(subprograms) {
            let operands = module.metadata(subprogram).as_tuple().unwrap();
            prop_assert_eq!(
                &operands[LegacyDebugInfo::SUBPROGRAM_FUNCTION_FIELD],
                &MdOperand::Function(func)
            );
        }
        prop_assert_eq!(di.active_subprogram(), subprograms.last().copied());
    }

    #[test]
    fn modern_locates_every_marked_instruction(lines in lines_strategy()) {
        let mut module = Module::new("prop");
        let config = DebugInfoConfig::development();
        let mut di = ModernDebugInfo::new(&mut module, &config, Path::new(SOURCE)).unwrap();
        let (func, entry) = define(&mut module, 0);
        di.mark_subprogram(&mut module, func, "f", 1);
        lower_lines(&mut di, &mut module, entry, &lines);

        let located: Vec<u32> = module
            .function_instructions(func)
            .map(|(_, instr)| {
                let location = instr.debug_location.unwrap();
                match module.metadata(location).as_debug().unwrap().get("line") {
                    Some(DiValue::Int(line)) => u32::try_from(*line).unwrap(),
                    other => panic!("location without line: {other:?}"),
                }
            })
            .collect();
        prop_assert_eq!(located, lines);
    }

    #[test]
    fn legacy_emits_one_marker_per_run(lines in lines_strategy()) {
        let mut module = Module::new("prop");
        let config = DebugInfoConfig::development();
        let mut di = LegacyDebugInfo::new(&mut module, &config, Path::new(SOURCE)).unwrap();
        let (func, entry) = define(&mut module, 0);
        di.mark_subprogram(&mut module, func, "f", 1);
        lower_lines(&mut di, &mut module, entry, &lines);

        let markers = marker_lines(&module, func);
        prop_assert_eq!(markers.len(), count_runs(&lines));
        for pair in markers.windows(2) {
            prop_assert_ne!(pair[0], pair[1]);
        }
        prop_assert_eq!(di.last_line(), lines.last().copied());
    }
}
