//! Name to descriptor index lookup

use std::collections::HashMap;

use crate::materials::MaterialData;

/// Lookup from material name to its index in the descriptor list.
///
/// When a library declares the same name twice the first descriptor wins and
/// the duplicate is reported.
#[derive(Debug, Default)]
pub struct MaterialMap {
    indices: HashMap<String, usize>,
}

impl MaterialMap {
    /// Build the lookup from an ordered descriptor list.
    pub fn build(materials: &[MaterialData]) -> Self {
        Self::from_names(materials.iter().map(|m| m.name.as_str()))
    }

    /// Build the lookup from a sequence of material names.
    pub fn from_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut indices = HashMap::new();
        for (i, name) in names.into_iter().enumerate() {
            if indices.contains_key(name) {
                log::warn!("duplicate material name '{}', keeping the first", name);
            } else {
                indices.insert(name.to_string(), i);
            }
        }
        Self { indices }
    }

    /// Index of the named material, if declared.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    /// Number of distinct material names.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when no material is known.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
