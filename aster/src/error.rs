//! Error kinds shared across lowering, linking and emission.

use thiserror::Error;

use crate::ir::{Index, QualifierKind};

#[derive(Debug, Error)]
pub enum Error {
    #[error("index %{index} out of range (pool holds {size} atoms)")]
    IndexOutOfRange { index: Index, size: usize },

    #[error("layout {kind:?} binding {binding} is bound to conflicting types")]
    LayoutConflict { kind: QualifierKind, binding: u32 },

    #[error("unsupported atom `{atom}` at %{index}")]
    UnsupportedAtom { index: Index, atom: String },

    #[error("no lowering was produced for %{index}")]
    MissingMapping { index: Index },

    #[error("emitter stack underflow")]
    EmitterStackUnderflow,

    #[error("unsupported emission target `{0}`")]
    FormatUnsupported(String),

    #[error("call ${0} does not resolve to a procedure in this unit")]
    UnresolvedCall(u32),
}

/// One finding of the layout-consistency validation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutFinding {
    pub kind: QualifierKind,
    pub binding: u32,
    /// The two qualifier atoms whose underlying types disagree.
    pub first: Index,
    pub second: Index,
}

impl From<LayoutFinding> for Error {
    fn from(finding: LayoutFinding) -> Error {
        Error::LayoutConflict {
            kind: finding.kind,
            binding: finding.binding,
        }
    }
}
