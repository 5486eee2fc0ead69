//! Debug info in the hierarchical `DI*` schema.
//!
//! ```text
//! !0 = !DIFile(directory: "/tmp", filename: "a.ori")
//! !1 = distinct !DICompileUnit(language: DW_LANG_C, file: !0, ...)
//! !3 = !DISubroutineType(types: !2)
//! !4 = distinct !DISubprogram(name: "f", ..., type: !3, unit: !1)
//! !5 = !DILocation(line: 4, column: 1, scope: !4)
//! ```
//!
//! Subprograms point at the compile unit through `unit:`; the unit becomes
//! reachable from `llvm.dbg.cu` at [`finalize`](DebugInfoBuilder::finalize).

use std::path::Path;

use tracing::{debug, trace};

use crate::config::{DebugInfoConfig, DebugInfoError};
use crate::ir::{FunctionId, IrBuilder, Module};
use crate::metadata::{DiKind, DiNode, DiValue, MetadataId, MetadataSink};

use super::{
    active_subprogram, add_module_flag, DebugInfoBuilder, FlagBehavior, SourceFile, SourceLoc,
    DEBUG_INFO_VERSION_FLAG, DWARF_VERSION_FLAG,
};

/// `emissionKind` value for full debug info (0 would be `NoDebug`).
const FULL_DEBUG: i64 = 1;

/// Debug info builder for backends that understand the `DI*` schema.
#[derive(Debug, Clone)]
pub struct ModernDebugInfo {
    source: SourceFile,
    optimized: bool,
    file: MetadataId,
    compile_unit: MetadataId,
    subprograms: Vec<MetadataId>,
    /// Scope for new locations. Only one function is active at a time.
    active_subprogram: Option<MetadataId>,
}

impl ModernDebugInfo {
    pub const DWARF_VERSION: i64 = 4;
    pub const DEBUG_INFO_VERSION: i64 = 3;
    pub const DBG_CU_NAME: &'static str = "llvm.dbg.cu";
    /// Column recorded in every location; only lines are tracked.
    pub const COLUMN: i64 = 1;

    /// Create the file and compile unit nodes for `source_path`.
    pub fn new(
        sink: &mut impl MetadataSink,
        config: &DebugInfoConfig,
        source_path: &Path,
    ) -> Result<Self, DebugInfoError> {
        let source = SourceFile::from_path(source_path)?;
        let file = di_file(sink, &source);
        let compile_unit = sink.add_debug_info(
            DiNode::new(DiKind::CompileUnit)
                .field("language", DiValue::Token(config.language.token()))
                .field("file", DiValue::Node(file))
                .field("producer", DiValue::Str(config.producer.clone()))
                .field("runtimeVersion", DiValue::Int(0))
                .field("isOptimized", DiValue::Bool(config.optimized))
                .field("emissionKind", DiValue::Int(FULL_DEBUG)),
            true,
        );
        debug!(
            directory = %source.directory,
            filename = %source.filename,
            "created modern debug info builder"
        );
        Ok(Self {
            source,
            optimized: config.optimized,
            file,
            compile_unit,
            subprograms: Vec::new(),
            active_subprogram: None,
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

    /// Subprograms in registration order.
    pub fn subprograms(&self) -> &[MetadataId] {
        &self.subprograms
    }

    pub fn active_subprogram(&self) -> Option<MetadataId> {
        self.active_subprogram
    }

    /// Build a subprogram and make it the active scope.
    pub fn add_subprogram(
        &mut self,
        sink: &mut impl MetadataSink,
        name: &str,
        linkage_name: &str,
        line: u32,
    ) -> MetadataId {
        // Requested per subprogram; the sink decides whether it is shared.
        let ty = di_subroutine_type(sink);
        let variables = sink.add_metadata(Vec::new());
        let subprogram = sink.add_debug_info(
            DiNode::new(DiKind::Subprogram)
                .field("name", DiValue::Str(name.to_owned()))
                .field("linkageName", DiValue::Str(linkage_name.to_owned()))
                .field("scope", DiValue::Node(self.file))
                .field("file", DiValue::Node(self.file))
                .field("line", DiValue::Int(i64::from(line)))
                .field("type", DiValue::Node(ty))
                .field("isLocal", DiValue::Bool(false))
                .field("isDefinition", DiValue::Bool(true))
                .field("scopeLine", DiValue::Int(i64::from(line)))
                .field("isOptimized", DiValue::Bool(self.optimized))
                .field("variables", DiValue::Node(variables))
                .field("unit", DiValue::Node(self.compile_unit)),
            true,
        );
        self.subprograms.push(subprogram);
        self.active_subprogram = Some(subprogram);
        subprogram
    }

    /// Build a location in the active subprogram.
    pub fn add_location(&self, sink: &mut impl MetadataSink, line: u32) -> MetadataId {
        let scope = active_subprogram(self.active_subprogram);
        sink.add_debug_info(
            DiNode::new(DiKind::Location)
                .field("line", DiValue::Int(i64::from(line)))
                .field("column", DiValue::Int(Self::COLUMN))
                .field("scope", DiValue::Node(scope)),
            false,
        )
    }
}

impl DebugInfoBuilder for ModernDebugInfo {
    fn mark_location(&mut self, builder: &mut IrBuilder<'_>, loc: SourceLoc) {
        let location = self.add_location(builder.module_mut(), loc.line);
        trace!(line = loc.line, "mark location");
        builder.set_current_debug_location(location);
    }

    fn mark_subprogram(&mut self, module: &mut Module, function: FunctionId, name: &str, line: u32) {
        let linkage_name = module.function_name(function).to_owned();
        let subprogram = self.add_subprogram(module, name, &linkage_name, line);
        module.set_function_metadata(function, "dbg", subprogram);
        debug!(name, linkage_name = %linkage_name, line, "mark subprogram");
    }

    fn finalize(&mut self, module: &mut Module) {
        module.add_named_metadata(Self::DBG_CU_NAME, self.compile_unit);
        add_module_flag(
            module,
            FlagBehavior::Warning,
            DWARF_VERSION_FLAG,
            Self::DWARF_VERSION,
        );
        add_module_flag(
            module,
            FlagBehavior::Warning,
            DEBUG_INFO_VERSION_FLAG,
            Self::DEBUG_INFO_VERSION,
        );
        debug!(
            subprograms = self.subprograms.len(),
            "finalized modern debug info"
        );
    }
}

fn di_file(sink: &mut impl MetadataSink, source: &SourceFile) -> MetadataId {
    sink.add_debug_info(
        DiNode::new(DiKind::File)
            .field("directory", DiValue::Str(source.directory.clone()))
            .field("filename", DiValue::Str(source.filename.clone())),
        false,
    )
}

fn di_subroutine_type(sink: &mut impl MetadataSink) -> MetadataId {
    let types = sink.add_metadata(Vec::new());
    sink.add_debug_info(
        DiNode::new(DiKind::SubroutineType).field("types", DiValue::Node(types)),
        false,
    )
}
