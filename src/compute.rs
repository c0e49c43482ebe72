use crate::{
    data::{CategoryError, Violation},
    read::ViolationSink,
};
use std::collections::BTreeMap;

/// All the violations of a given category, always kept sorted by entry date.
/// Violations entered on the same date stay in the order they were added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Category {
    name: String,
    violations: Vec<Violation>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            violations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert after every violation entered on or before this one; that's what keeps
    /// equal dates in insertion order.
    pub fn add(&mut self, violation: Violation) {
        let at = self
            .violations
            .partition_point(|v| v.entered <= violation.entered);
        self.violations.insert(at, violation);
    }

    pub fn earliest(&self) -> Result<&Violation, CategoryError> {
        self.violations
            .first()
            .ok_or_else(|| CategoryError::Empty(self.name.clone()))
    }

    pub fn latest(&self) -> Result<&Violation, CategoryError> {
        self.violations
            .last()
            .ok_or_else(|| CategoryError::Empty(self.name.clone()))
    }

    pub fn count(&self) -> usize {
        self.violations.len()
    }
}

/// The whole data set, one `Category` per name. A `BTreeMap` so that reports come
/// out in the same (alphabetical) order every run.
#[derive(Debug, Default)]
pub(crate) struct Categories {
    categories: BTreeMap<String, Category>,
}

impl Categories {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Number of violations over every category.
    pub fn total(&self) -> usize {
        self.iter().map(Category::count).sum()
    }
}

impl ViolationSink for Categories {
    fn use_violation(&mut self, violation: Violation) {
        self.categories
            .entry(violation.category.clone())
            .or_insert_with_key(|name| Category::new(name.as_str()))
            .add(violation);
    }
}
