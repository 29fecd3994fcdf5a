use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CmftError;

/// Mark of the background assay each sample's rows are linked against.
pub const CONTROL_MARK: &str = "ChIP-Seq input";

pub const DEFAULT_HOST: &str = "ftp.ncbi.nlm.nih.gov";

pub const BED_SUFFIX: &str = ".bed.gz";

/// Supplementary-file directory of a GEO sample, reduced to its host-relative
/// path without surrounding slashes. Links are rebuilt against the configured
/// host, so the host of the metadata URL only has to be present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplementaryUrl {
    path: String,
}

impl SupplementaryUrl {
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl FromStr for SupplementaryUrl {
    type Err = CmftError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let rest = trimmed
            .strip_prefix("ftp://")
            .or_else(|| trimmed.strip_prefix("https://"))
            .or_else(|| trimmed.strip_prefix("http://"))
            .ok_or_else(|| CmftError::InvalidSupplementaryUrl(value.to_string()))?;
        let (host, path) = rest
            .split_once('/')
            .ok_or_else(|| CmftError::InvalidSupplementaryUrl(value.to_string()))?;
        let path = path.trim_matches('/');
        if host.is_empty() || path.is_empty() {
            return Err(CmftError::InvalidSupplementaryUrl(value.to_string()));
        }
        Ok(Self {
            path: path.to_string(),
        })
    }
}
