use std::fmt::{Display, Formatter};

use crate::SourceId;

/// Fatal pipeline errors. Anything not listed here is absorbed as a warning
/// and the run continues with partial data.
#[derive(Debug)]
pub enum PipelineError {
    /// The primary source could not establish identity/credentials. Without
    /// it the run would silently produce a near-empty pick list.
    PrimarySourceInit { source: SourceId, reason: String },

    /// Every source completed but the merged result set is empty. Nothing to
    /// do is indistinguishable from total failure, so it is surfaced.
    NoSales,
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrimarySourceInit { source, reason } => {
                write!(f, "primary source '{source}' failed to initialize: {reason}")
            }
            Self::NoSales => f.write_str("no sales found across any source"),
        }
    }
}

impl std::error::Error for PipelineError {}
