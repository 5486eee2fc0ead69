//! Debug info in the flat, numerically tagged schema (LLVM 3.4 era).
//!
//! NVVM-style backends only accept this layout and run a verify pass that
//! strips any debug metadata they cannot validate. Every node is therefore an
//! ordered tuple whose field order is fixed by the historical schema, and
//! locations travel on a side-effecting inline-asm call under a private
//! metadata key instead of the standard `!dbg` slot:
//!
//! ```text
//! call void asm sideeffect "// dbg 4", ""(), !ori.dbg !9
//! !9 = !{i32 4, i32 0, !7, null}
//! ```
//!
//! The compile unit embeds the whole subprogram list. It is built at
//! construction, before any subprogram exists, so the field holds a growable
//! list handle that is filled by [`mark_subprogram`] and resolved when the
//! module is printed.
//!
//! [`mark_subprogram`]: DebugInfoBuilder::mark_subprogram

use std::path::Path;

use tracing::{debug, trace};

use crate::config::{DebugInfoConfig, DebugInfoError};
use crate::ir::{FnType, FunctionId, InlineAsm, IrBuilder, Module};
use crate::metadata::{ListId, MdOperand, MetadataId, MetadataSink};

use super::{
    active_subprogram, add_module_flag, DebugInfoBuilder, FlagBehavior, SourceFile, SourceLoc,
    DEBUG_INFO_VERSION_FLAG,
};

/// `LLVMDebugVersion` 12, shifted into the upper half of every tag.
const LLVM_DEBUG_VERSION: i64 = 12 << 16;

const DW_TAG_COMPILE_UNIT: i64 = 0x11;
const DW_TAG_SUBROUTINE_TYPE: i64 = 0x15;
const DW_TAG_FILE_TYPE: i64 = 0x29;
const DW_TAG_SUBPROGRAM: i64 = 0x2e;

/// Versioned node tag (`786449` for a compile unit).
const fn tag(dw_tag: i64) -> i64 {
    LLVM_DEBUG_VERSION | dw_tag
}

/// Debug info builder for backends that only accept the legacy schema.
#[derive(Debug, Clone)]
pub struct LegacyDebugInfo {
    source: SourceFile,
    optimized: bool,
    file: MetadataId,
    compile_unit: MetadataId,
    /// Shared with the compile unit's subprogram field.
    subprograms: ListId,
    /// Scope for new locations. Only one function is active at a time.
    active_subprogram: Option<MetadataId>,
    /// Line of the last emitted location marker.
    last_line: Option<u32>,
}

impl LegacyDebugInfo {
    /// Required by NVVM backends. No DWARF version flag is
    /// written; the backend does not recognize it.
    pub const DEBUG_INFO_VERSION: i64 = 1;
    /// Kept out of `llvm.dbg.cu` so the backend's sanitizer leaves it alone.
    pub const DBG_CU_NAME: &'static str = "ori.llvm.dbg.cu";
    /// Private key carrying locations on marker calls.
    pub const LOCATION_KEY: &'static str = "ori.dbg";

    pub const COMPILE_UNIT_TAG: i64 = tag(DW_TAG_COMPILE_UNIT);
    pub const SUBROUTINE_TYPE_TAG: i64 = tag(DW_TAG_SUBROUTINE_TYPE);
    pub const FILE_TAG: i64 = tag(DW_TAG_FILE_TYPE);
    pub const SUBPROGRAM_TAG: i64 = tag(DW_TAG_SUBPROGRAM);

    /// Index of the subprogram list inside the compile unit tuple.
    pub const CU_SUBPROGRAMS_FIELD: usize = 9;
    /// Index of the function reference inside a subprogram tuple.
    pub const SUBPROGRAM_FUNCTION_FIELD: usize = 15;

    /// Create the file and compile unit nodes for `source_path`.
    pub fn new(
        sink: &mut impl MetadataSink,
        config: &DebugInfoConfig,
        source_path: &Path,
    ) -> Result<Self, DebugInfoError> {
        let source = SourceFile::from_path(source_path)?;
        let file = di_file(sink, &source);
        let subprograms = sink.new_list();

        let pair = file_pair(sink, &source);
        let empty = sink.add_metadata(vec![MdOperand::i32(0)]);
        let compile_unit = sink.add_metadata(vec![
            MdOperand::i32(Self::COMPILE_UNIT_TAG),
            MdOperand::Node(pair),
            MdOperand::i32(config.language.dwarf_code()),
            MdOperand::str(config.producer.as_str()),
            MdOperand::bool(config.optimized),
            MdOperand::str(""), // flags
            MdOperand::i32(0),  // runtime version
            MdOperand::Node(empty), // enum types
            MdOperand::Node(empty), // retained types
            MdOperand::List(subprograms),
            MdOperand::Node(empty), // global variables
            MdOperand::Node(empty), // imported entities
            MdOperand::str(""), // split debug filename
        ]);
        debug!(
            directory = %source.directory,
            filename = %source.filename,
            "created legacy debug info builder"
        );
        Ok(Self {
            source,
            optimized: config.optimized,
            file,
            compile_unit,
            subprograms,
            active_subprogram: None,
            last_line: None,
        })
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn file(&self) -> MetadataId {
        self.file
    }

    pub fn compile_unit(&self) -> MetadataId {
        self.compile_unit
    }

    /// The list embedded in the compile unit.
    pub fn subprogram_list(&self) -> ListId {
        self.subprograms
    }

    pub fn active_subprogram(&self) -> Option<MetadataId> {
        self.active_subprogram
    }

    pub fn last_line(&self) -> Option<u32> {
        self.last_line
    }

    /// Build a subprogram, append it to the compile unit's list, and make
    /// it the active scope.
    ///
    /// The function reference is resolved by looking `linkage_name` up in
    /// the module; an unknown name is recorded as `null`.
    pub fn add_subprogram(
        &mut self,
        sink: &mut impl MetadataSink,
        name: &str,
        linkage_name: &str,
        line: u32,
    ) -> MetadataId {
        let function = sink
            .get_function(linkage_name)
            .map_or(MdOperand::Null, MdOperand::Function);
        let ty = di_subroutine_type(sink);
        let variables = sink.add_metadata(vec![MdOperand::i32(0)]);
        let context = di_file(sink, &self.source);
        let pair = file_pair(sink, &self.source);
        let line = i64::from(line);
        let subprogram = sink.add_metadata(vec![
            MdOperand::i32(Self::SUBPROGRAM_TAG),
            MdOperand::Node(pair),
            MdOperand::Node(context),
            MdOperand::str(name),
            MdOperand::str(name), // display name
            MdOperand::str(linkage_name),
            MdOperand::i32(line),
            MdOperand::Node(ty),
            MdOperand::bool(false), // is local
            MdOperand::bool(true),  // is definition
            MdOperand::i32(0),      // virtuality
            MdOperand::i32(0),      // virtual index
            MdOperand::Null,        // vtable base type
            MdOperand::i32(0),      // flags
            MdOperand::bool(self.optimized),
            function,
            MdOperand::Null, // template parameters
            MdOperand::Null, // declaration
            MdOperand::Node(variables),
            MdOperand::i32(line), // scope line
        ]);
        sink.push_to_list(self.subprograms, subprogram);
        self.active_subprogram = Some(subprogram);
        subprogram
    }

    /// Build a location tuple in the active subprogram.
    pub fn add_location(&self, sink: &mut impl MetadataSink, line: u32) -> MetadataId {
        let scope = active_subprogram(self.active_subprogram);
        sink.add_metadata(vec![
            MdOperand::i32(i64::from(line)),
            MdOperand::i32(0), // column
            MdOperand::Node(scope),
            MdOperand::Null, // original scope
        ])
    }
}

impl DebugInfoBuilder for LegacyDebugInfo {
    fn mark_location(&mut self, builder: &mut IrBuilder<'_>, loc: SourceLoc) {
        if self.last_line == Some(loc.line) {
            trace!(line = loc.line, "skip repeated line");
            return;
        }
        let location = self.add_location(builder.module_mut(), loc.line);
        self.last_line = Some(loc.line);

        let marker = InlineAsm::new(FnType::void(), format!("// dbg {}", loc.line), "", true);
        let call = builder.build_inline_asm_call(marker, Vec::new());
        builder
            .module_mut()
            .set_instruction_metadata(call, Self::LOCATION_KEY, location);
        trace!(line = loc.line, "mark location");
    }

    fn mark_subprogram(&mut self, module: &mut Module, function: FunctionId, name: &str, line: u32) {
        let linkage_name = module.function_name(function).to_owned();
        self.add_subprogram(module, name, &linkage_name, line);
        debug!(name, linkage_name = %linkage_name, line, "mark subprogram");
    }

    fn finalize(&mut self, module: &mut Module) {
        module.add_named_metadata(Self::DBG_CU_NAME, self.compile_unit);
        add_module_flag(
            module,
            FlagBehavior::Warning,
            DEBUG_INFO_VERSION_FLAG,
            Self::DEBUG_INFO_VERSION,
        );
        debug!(
            subprograms = module.list(self.subprograms).len(),
            "finalized legacy debug info"
        );
    }
}

/// `!{!"filename", !"directory"}`
fn file_pair(sink: &mut impl MetadataSink, source: &SourceFile) -> MetadataId {
    sink.add_metadata(vec![
        MdOperand::str(source.filename.as_str()),
        MdOperand::str(source.directory.as_str()),
    ])
}

fn di_file(sink: &mut impl MetadataSink, source: &SourceFile) -> MetadataId {
    let pair = file_pair(sink, source);
    sink.add_metadata(vec![
        MdOperand::i32(LegacyDebugInfo::FILE_TAG),
        MdOperand::Node(pair),
    ])
}

fn di_subroutine_type(sink: &mut impl MetadataSink) -> MetadataId {
    let types = sink.add_metadata(vec![MdOperand::Null]);
    sink.add_metadata(vec![
        MdOperand::i32(LegacyDebugInfo::SUBROUTINE_TYPE_TAG),
        MdOperand::i32(0),
        MdOperand::Null,
        MdOperand::str(""),
        MdOperand::i32(0), // line
        MdOperand::i64(0), // size in bits
        MdOperand::i64(0), // offset in bits
        MdOperand::i64(0), // align in bits
        MdOperand::i32(0), // flags
        MdOperand::Null,
        MdOperand::Node(types),
        MdOperand::i32(0),
        MdOperand::Null,
        MdOperand::Null,
        MdOperand::Null,
    ])
}
