use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Canonical source identifiers used in logs and run summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Marketplace,
    Storefront,
    Erp,
}

impl SourceId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Marketplace => "marketplace",
            Self::Storefront => "storefront",
            Self::Erp => "erp",
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
