//! Test utilities and mocks for orogen unit tests.
//!
//! Provides an in-memory package catalog standing in for pkg-config, plus
//! fixture helpers that install typekit and task-library descriptions into
//! a temporary directory.

pub mod fixtures;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::locator::{LocateError, PackageLocator, PkgInfo};

#[derive(Debug, Default)]
struct MockLocatorInner {
    packages: HashMap<String, PkgInfo>,
    lookups: Vec<String>,
}

/// In-memory package catalog.
///
/// Clones share the same catalog and lookup log, so a test can keep a
/// handle after moving a clone into a Project and assert on the lookups
/// performed.
#[derive(Debug, Clone, Default)]
pub struct MockLocator {
    inner: Rc<RefCell<MockLocatorInner>>,
}

impl MockLocator {
    /// Create an empty catalog.
    pub fn new() -> Self {
        MockLocator::default()
    }

    /// Install a package record.
    pub fn add(&self, info: PkgInfo) {
        self.inner
            .borrow_mut()
            .packages
            .insert(info.name.clone(), info);
    }

    /// All lookups performed so far, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.inner.borrow().lookups.clone()
    }

    /// Number of lookups performed for the given package name.
    pub fn lookup_count(&self, name: &str) -> usize {
        self.inner
            .borrow()
            .lookups
            .iter()
            .filter(|lookup| lookup.as_str() == name)
            .count()
    }
}

impl PackageLocator for MockLocator {
    fn locate(&self, name: &str) -> Result<PkgInfo, LocateError> {
        let mut inner = self.inner.borrow_mut();
        inner.lookups.push(name.to_string());
        inner
            .packages
            .get(name)
            .cloned()
            .ok_or_else(|| LocateError::NotFound {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_locator_records_lookups() {
        let locator = MockLocator::new();
        locator.add(PkgInfo::new("opencv", "/usr"));

        assert!(locator.locate("opencv").is_ok());
        assert!(locator.locate("missing").is_err());
        assert_eq!(locator.lookup_count("opencv"), 1);
        assert_eq!(locator.lookup_count("missing"), 1);
        assert_eq!(locator.lookups(), ["opencv", "missing"]);
    }

    #[test]
    fn test_clones_share_the_catalog() {
        let locator = MockLocator::new();
        let clone = locator.clone();
        clone.add(PkgInfo::new("opencv", "/usr"));

        assert!(locator.locate("opencv").is_ok());
        assert_eq!(clone.lookup_count("opencv"), 1);
    }
}
