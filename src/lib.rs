//! FASTA to Assembly import, Assembly to FASTA export and object-type resolution

pub mod cli;
pub mod export;
pub mod import;
pub mod parallel;
pub mod resolver;
pub mod workspace;

pub use crate::export::{AssemblyExporter, FastaFile};
pub use crate::import::{
    AssemblyRecord, ImportBatch, ImportInput, ImportOrchestrator, ImportRequest, ImportResult,
    InputSource, MassImportParams, RecordMetadata, SaveAssemblyParams, WorkspaceTarget,
};
pub use crate::parallel::{fan_out, split_even, FanOutDriver};
pub use crate::resolver::{FastaResolution, ObjectKind, TypeResolver};
pub use crate::workspace::{ScratchSession, ScratchSpace, UuidGenerator};

pub use assembly_core::{AssemblyError, AssemblyResult, Config};
