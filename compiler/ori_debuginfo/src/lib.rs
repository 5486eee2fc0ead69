//! Debug Information for the Ori JIT
//!
//! This crate turns source positions (file, function name, line) reported by
//! the compiler driver into the debug-metadata graph a native backend needs
//! to map machine code back to source lines and function boundaries.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │  Driver         │────▶│ DebugInfoBuilder │────▶│  Module         │
//! │  (fn, line)     │     │ (Noop/Modern/    │     │  (metadata      │
//! │                 │     │  Legacy)         │     │   graph, IR)    │
//! └─────────────────┘     └──────────────────┘     └─────────────────┘
//! ```
//!
//! - [`ModernDebugInfo`]: hierarchical `DI*` nodes, `llvm.dbg.cu`, module
//!   flags `Dwarf Version` 4 and `Debug Info Version` 3.
//! - [`LegacyDebugInfo`]: flat numerically tagged tuples for NVVM-style
//!   backends, `Debug Info Version` 1, locations carried by inline-asm
//!   marker calls under a private metadata key.
//! - [`NoopDebugInfo`]: selected when debug info is disabled.
//!
//! # Usage
//!
//! ```
//! use ori_debuginfo::{
//!     create_debug_info, DebugInfoBuilder, DebugInfoConfig, FnType, IrBuilder, Module,
//!     SourceLoc,
//! };
//!
//! let mut module = Module::new("jit");
//! let config = DebugInfoConfig::development();
//! let mut di = create_debug_info(&mut module, &config, "/src/main.ori").unwrap();
//!
//! let func = module.add_function("main", FnType::void()).unwrap();
//! di.mark_subprogram(&mut module, func, "main", 1);
//! let entry = module.append_block(func, "entry");
//! let mut builder = IrBuilder::at_end(&mut module, entry);
//! di.mark_location(&mut builder, SourceLoc::new(2));
//! builder.build_ret(None);
//!
//! di.finalize(&mut module);
//! assert!(module.to_string().contains("!llvm.dbg.cu"));
//! ```
//!
//! # Debugging
//!
//! - `RUST_LOG=ori_debuginfo=debug`: builder construction, subprograms,
//!   finalization
//! - `RUST_LOG=ori_debuginfo=trace`: every location mark
//! - `ORI_DEBUGINFO=1`, `ORI_DEBUGINFO_SCHEMA=legacy`: read by
//!   [`DebugInfoConfig::from_env`]

mod builder;
mod config;
mod emit;
pub mod ir;
pub mod metadata;

pub use builder::{
    add_module_flag, create_debug_info, DebugInfoBuilder, FlagBehavior, LegacyDebugInfo,
    ModernDebugInfo, NoopDebugInfo, SourceFile, SourceLoc, DEBUG_INFO_VERSION_FLAG,
    DWARF_VERSION_FLAG, MODULE_FLAGS,
};
pub use config::{DebugInfoConfig, DebugInfoError, DebugLevel, MetadataSchema, SourceLanguage};
pub use ir::{FnType, FunctionId, InstrId, IrBuilder, IrError, IrType, Module};
pub use metadata::{MdOperand, Metadata, MetadataId, MetadataSink};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=ori_debuginfo=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
