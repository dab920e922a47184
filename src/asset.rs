use std::fmt;

/// A resolved reference to a displayable resource.
///
/// Two references are the same asset exactly when their strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AssetRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// An unverified location built from base path, index and extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateReference<'a> {
    pub base_path: &'a str,
    pub index: u32,
    pub extension: &'a str,
}

impl CandidateReference<'_> {
    pub fn to_asset_ref(&self) -> AssetRef {
        let base = self.base_path.trim_end_matches('/');
        if base.is_empty() {
            AssetRef(format!("{}.{}", self.index, self.extension))
        } else {
            AssetRef(format!("{}/{}.{}", base, self.index, self.extension))
        }
    }
}
