//! Registry mapping bulletin families to their formats.

use std::collections::BTreeMap;
use std::path::Path;

use super::{BulletinA, BulletinB, BulletinC, BulletinD, BulletinFormat};
use crate::types::Family;

/// Registry of bulletin formats keyed by family.
///
/// Iteration follows family order, so lookups that try every format are
/// deterministic.
pub struct BulletinRegistry {
    formats: BTreeMap<Family, Box<dyn BulletinFormat>>,
}

impl BulletinRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            formats: BTreeMap::new(),
        }
    }

    /// Register a format, replacing any earlier one for the same family.
    pub fn register(&mut self, format: impl BulletinFormat + 'static) {
        self.formats.insert(format.family(), Box::new(format));
    }

    /// Format of a family.
    #[must_use]
    pub fn get(&self, family: Family) -> Option<&dyn BulletinFormat> {
        self.formats.get(&family).map(|f| f.as_ref())
    }

    /// Format of a product type such as `IERS_B`.
    #[must_use]
    pub fn get_by_product_type(&self, product_type: &str) -> Option<&dyn BulletinFormat> {
        self.formats
            .values()
            .find(|f| f.product_type() == product_type)
            .map(|f| f.as_ref())
    }

    /// First format whose filename grammar accepts `paths`.
    #[must_use]
    pub fn identify(&self, paths: &[&Path]) -> Option<&dyn BulletinFormat> {
        self.formats
            .values()
            .find(|f| f.identify(paths))
            .map(|f| f.as_ref())
    }

    /// Registered families in order.
    pub fn families(&self) -> impl Iterator<Item = Family> + '_ {
        self.formats.keys().copied()
    }

    /// Product types of all registered families.
    #[must_use]
    pub fn product_types(&self) -> Vec<&'static str> {
        self.formats.values().map(|f| f.product_type()).collect()
    }
}

impl Default for BulletinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry holding all four IERS bulletin families.
#[must_use]
pub fn create_bulletin_registry() -> BulletinRegistry {
    let mut registry = BulletinRegistry::new();
    registry.register(BulletinA);
    registry.register(BulletinB);
    registry.register(BulletinC);
    registry.register(BulletinD);
    registry
}
