use std::collections::HashSet;
use std::ops::Index;

use crate::asset::AssetRef;

/// Ordered, duplicate-free sequence of assets in display order.
///
/// Lists produced by [`AssetList::build`] are never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetList {
    assets: Vec<AssetRef>,
}

impl AssetList {
    /// Configured assets first, then discovered ones not already listed.
    ///
    /// The first occurrence of a reference wins and later repeats are dropped.
    /// An empty merge becomes `[fallback]`.
    pub fn build(configured: &[AssetRef], discovered: &[AssetRef], fallback: AssetRef) -> Self {
        let mut seen = HashSet::new();
        let mut assets: Vec<AssetRef> = configured
            .iter()
            .chain(discovered)
            .filter(|asset| seen.insert(*asset))
            .cloned()
            .collect();

        if assets.is_empty() {
            assets.push(fallback);
        }
        Self { assets }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AssetRef> {
        self.assets.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AssetRef> {
        self.assets.iter()
    }

    pub fn as_slice(&self) -> &[AssetRef] {
        &self.assets
    }
}

impl Index<usize> for AssetList {
    type Output = AssetRef;

    fn index(&self, index: usize) -> &AssetRef {
        &self.assets[index]
    }
}

impl<'a> IntoIterator for &'a AssetList {
    type Item = &'a AssetRef;
    type IntoIter = std::slice::Iter<'a, AssetRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
