//! Owned satellite catalog keyed by NORAD ID

use std::collections::HashMap;

use super::{ElementSetError, OrbitalElementSet};

/// Arena of parsed element sets indexed by catalog id
///
/// The host application creates and drops the catalog; nothing in the crate
/// keeps a process-wide copy.
#[derive(Debug, Clone, Default)]
pub struct SatelliteCatalog {
    sets: HashMap<u32, OrbitalElementSet>,
}

/// Outcome of a bulk TLE load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub rejected: usize,
}

impl SatelliteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element set, returning the one it replaced
    pub fn insert(&mut self, set: OrbitalElementSet) -> Option<OrbitalElementSet> {
        self.sets.insert(set.catalog_id(), set)
    }

    pub fn remove(&mut self, catalog_id: u32) -> Option<OrbitalElementSet> {
        self.sets.remove(&catalog_id)
    }

    pub fn get(&self, catalog_id: u32) -> Option<&OrbitalElementSet> {
        self.sets.get(&catalog_id)
    }

    pub fn contains(&self, catalog_id: u32) -> bool {
        self.sets.contains_key(&catalog_id)
    }

    /// All catalog ids in ascending order
    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.sets.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrbitalElementSet> {
        self.sets.values()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn clear(&mut self) {
        self.sets.clear();
    }

    /// Display name for an id, whether or not it is in the catalog
    pub fn display_name(&self, catalog_id: u32) -> String {
        self.sets
            .get(&catalog_id)
            .map(OrbitalElementSet::display_name)
            .unwrap_or_else(|| format!("NORAD {}", catalog_id))
    }

    /// Name for an id only if the catalog knows one
    pub fn known_name(&self, catalog_id: u32) -> Option<&str> {
        self.sets.get(&catalog_id).and_then(OrbitalElementSet::name)
    }

    /// Parse and insert many `(name, line1, line2)` entries
    ///
    /// Malformed entries are skipped and counted.
    pub fn load_tles<'a, I>(&mut self, entries: I) -> LoadReport
    where
        I: IntoIterator<Item = (Option<&'a str>, &'a str, &'a str)>,
    {
        let mut report = LoadReport::default();

        for (name, line1, line2) in entries {
            match OrbitalElementSet::parse_named(name, line1, line2) {
                Ok(set) => {
                    self.insert(set);
                    report.loaded += 1;
                }
                Err(e) => {
                    log::debug!("Skipping element set {:?}: {}", name, e);
                    report.rejected += 1;
                }
            }
        }

        log::info!(
            "Loaded {} TLEs for propagation ({} rejected)",
            report.loaded,
            report.rejected
        );
        report
    }

    /// Parse and insert one element set
    pub fn add_tle(
        &mut self,
        name: Option<&str>,
        line1: &str,
        line2: &str,
    ) -> Result<u32, ElementSetError> {
        let set = OrbitalElementSet::parse_named(name, line1, line2)?;
        let id = set.catalog_id();
        self.insert(set);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::element_set::tests::{ISS_LINE1, ISS_LINE2, ISS_NAME};

    #[test]
    fn test_load_tles_counts_rejections() {
        let mut catalog = SatelliteCatalog::new();
        let report = catalog.load_tles(vec![
            (Some(ISS_NAME), ISS_LINE1, ISS_LINE2),
            (Some("BROKEN"), "1 garbage", ISS_LINE2),
        ]);

        assert_eq!(report, LoadReport { loaded: 1, rejected: 1 });
        assert_eq!(catalog.ids(), vec![25544]);
        assert_eq!(catalog.display_name(25544), ISS_NAME);
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut catalog = SatelliteCatalog::new();
        catalog.add_tle(None, ISS_LINE1, ISS_LINE2).unwrap();
        let previous = catalog
            .insert(OrbitalElementSet::parse_named(Some("ISS"), ISS_LINE1, ISS_LINE2).unwrap());

        assert!(previous.is_some());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.known_name(25544), Some("ISS"));
    }

    #[test]
    fn test_display_name_unknown_id() {
        let catalog = SatelliteCatalog::new();
        assert_eq!(catalog.display_name(39089), "NORAD 39089");
        assert!(catalog.known_name(39089).is_none());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut catalog = SatelliteCatalog::new();
        catalog.add_tle(None, ISS_LINE1, ISS_LINE2).unwrap();
        assert!(catalog.remove(25544).is_some());
        assert!(catalog.is_empty());

        catalog.add_tle(None, ISS_LINE1, ISS_LINE2).unwrap();
        catalog.clear();
        assert!(!catalog.contains(25544));
    }
}
