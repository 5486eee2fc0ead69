//! The debug-info builder contract and the pieces its variants share.
//!
//! The compiler driver talks to exactly one [`DebugInfoBuilder`] per module:
//!
//! 1. construct it when the module is created,
//! 2. [`mark_subprogram`](DebugInfoBuilder::mark_subprogram) once per
//!    function, before its body,
//! 3. [`mark_location`](DebugInfoBuilder::mark_location) before each
//!    instruction that starts a new source line,
//! 4. [`finalize`](DebugInfoBuilder::finalize) once, before the module is
//!    handed to the backend.
//!
//! [`create_debug_info`] picks the variant from a [`DebugInfoConfig`], so
//! call sites never branch on whether debug info is enabled.

mod legacy;
mod modern;

use std::path::{Component, Path, PathBuf};

use crate::config::{invalid_source_path, DebugInfoConfig, DebugInfoError, MetadataSchema};
use crate::ir::{FunctionId, IrBuilder, Module};
use crate::metadata::{MdOperand, MetadataId, MetadataSink};

pub use legacy::LegacyDebugInfo;
pub use modern::ModernDebugInfo;

/// Named metadata holding module flags.
pub const MODULE_FLAGS: &str = "llvm.module.flags";

/// Module flag name for the DWARF version.
pub const DWARF_VERSION_FLAG: &str = "Dwarf Version";

/// Module flag name for the debug metadata version.
pub const DEBUG_INFO_VERSION_FLAG: &str = "Debug Info Version";

/// A source position reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLoc {
    /// 1-based source line.
    pub line: u32,
}

impl SourceLoc {
    pub fn new(line: u32) -> Self {
        Self { line }
    }
}

/// Operations every debug-info variant implements.
pub trait DebugInfoBuilder {
    /// Attach a location for `loc.line` to what `builder` emits next.
    ///
    /// Must follow a [`mark_subprogram`](Self::mark_subprogram) call for the
    /// function being emitted.
    fn mark_location(&mut self, builder: &mut IrBuilder<'_>, loc: SourceLoc);

    /// Register `function` as a new subprogram defined at `line`.
    ///
    /// The linkage name comes from the function; `name` is the display name.
    fn mark_subprogram(&mut self, module: &mut Module, function: FunctionId, name: &str, line: u32);

    /// Commit the compile unit and module flags. Call exactly once, last.
    fn finalize(&mut self, module: &mut Module);
}

/// Create the builder selected by `config`.
///
/// A disabled level yields a [`NoopDebugInfo`] without touching the path.
pub fn create_debug_info(
    module: &mut Module,
    config: &DebugInfoConfig,
    source_path: impl AsRef<Path>,
) -> Result<Box<dyn DebugInfoBuilder>, DebugInfoError> {
    if !config.level.is_enabled() {
        return Ok(Box::new(NoopDebugInfo));
    }
    let source_path = source_path.as_ref();
    Ok(match config.schema {
        MetadataSchema::Modern => Box::new(ModernDebugInfo::new(module, config, source_path)?),
        MetadataSchema::Legacy => Box::new(LegacyDebugInfo::new(module, config, source_path)?),
    })
}

// -- No-op --

/// Builder used when debug info is disabled. Every operation does nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopDebugInfo;

impl DebugInfoBuilder for NoopDebugInfo {
    fn mark_location(&mut self, _builder: &mut IrBuilder<'_>, _loc: SourceLoc) {}

    fn mark_subprogram(
        &mut self,
        _module: &mut Module,
        _function: FunctionId,
        _name: &str,
        _line: u32,
    ) {
    }

    fn finalize(&mut self, _module: &mut Module) {}
}

// -- Shared helpers --

/// Source file split into the (directory, filename) pair debug info records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub directory: String,
    pub filename: String,
}

impl SourceFile {
    /// Make `path` absolute, normalize `.`/`..` lexically, and split it.
    ///
    /// The file system is not consulted.
    pub fn from_path(path: &Path) -> Result<Self, DebugInfoError> {
        if path.as_os_str().is_empty() {
            return Err(invalid_source_path(path, "path is empty"));
        }
        let absolute =
            std::path::absolute(path).map_err(|e| invalid_source_path(path, e.to_string()))?;
        let normalized = normalize(&absolute);
        let filename = normalized
            .file_name()
            .ok_or_else(|| invalid_source_path(path, "path has no file name"))?
            .to_string_lossy()
            .into_owned();
        let directory = normalized
            .parent()
            .map_or_else(String::new, |dir| dir.to_string_lossy().into_owned());
        Ok(Self {
            directory,
            filename,
        })
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Module flag merge behavior (first operand of a flag tuple).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagBehavior {
    Error = 1,
    Warning = 2,
    Require = 3,
    Override = 4,
    Append = 5,
    AppendUnique = 6,
}

/// Add `!{i32 behavior, !"key", i32 value}` to the module flags.
///
/// Identical flags are uniqued by the sink, so an already registered flag is
/// detected by identity and not added again. Returns whether it was added.
pub fn add_module_flag(
    sink: &mut impl MetadataSink,
    behavior: FlagBehavior,
    key: &str,
    value: i64,
) -> bool {
    let flag = sink.add_metadata(vec![
        MdOperand::i32(behavior as i64),
        MdOperand::str(key),
        MdOperand::i32(value),
    ]);
    if sink.named_metadata(MODULE_FLAGS).contains(&flag) {
        return false;
    }
    sink.add_named_metadata(MODULE_FLAGS, flag);
    true
}

/// The subprogram a new location belongs to.
///
/// Marking a location before any subprogram is a driver bug; it would
/// otherwise surface as a dangling scope in the backend's verifier.
#[track_caller]
pub(crate) fn active_subprogram(active: Option<MetadataId>) -> MetadataId {
    match active {
        Some(subprogram) => subprogram,
        None => panic!("mark_location called before any mark_subprogram"),
    }
}
