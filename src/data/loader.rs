//! Catalog loading from JSON databases and TLE text files

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{LoadReport, SatelliteCatalog, TleData};

/// Root structure of a space objects JSON database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDatabase {
    #[serde(default)]
    pub generated_at: Option<String>,
    pub objects: HashMap<String, CatalogObject>,
}

/// A single catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogObject {
    pub norad_cat_id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tle: Option<TleData>,
}

/// Load a catalog from a JSON object database
pub fn load_catalog_json(path: impl AsRef<Path>) -> Result<SatelliteCatalog> {
    let path = path.as_ref();
    log::info!("Loading space objects from {:?}", path);

    let file = File::open(path)
        .with_context(|| format!("Failed to open space objects file: {:?}", path))?;

    let reader = BufReader::new(file);
    let db: CatalogDatabase =
        serde_json::from_reader(reader).with_context(|| "Failed to parse space objects JSON")?;

    log::info!(
        "Loaded {} space objects (generated at {})",
        db.objects.len(),
        db.generated_at.as_deref().unwrap_or("unknown")
    );

    let mut catalog = SatelliteCatalog::new();
    catalog_from_database(&db, &mut catalog);
    Ok(catalog)
}

/// Insert every object with a TLE into the catalog
pub fn catalog_from_database(db: &CatalogDatabase, catalog: &mut SatelliteCatalog) -> LoadReport {
    catalog.load_tles(db.objects.values().filter_map(|obj| {
        obj.tle
            .as_ref()
            .map(|tle| (obj.name.as_deref(), tle.line1.as_str(), tle.line2.as_str()))
    }))
}

/// Load a catalog from a 2LE/3LE text file
pub fn load_catalog_tle(path: impl AsRef<Path>) -> Result<SatelliteCatalog> {
    let path = path.as_ref();
    log::info!("Loading TLE text from {:?}", path);

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read TLE file: {:?}", path))?;

    let mut catalog = SatelliteCatalog::new();
    catalog.load_tles(split_tle_text(&text));
    Ok(catalog)
}

/// Load a catalog, choosing the format from the file extension
pub fn load_catalog(path: impl AsRef<Path>) -> Result<SatelliteCatalog> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_catalog_json(path),
        _ => load_catalog_tle(path),
    }
}

/// Split TLE text into `(name, line1, line2)` entries
///
/// A line that does not start with a line-number marker is taken as the name of
/// the pair that follows. Orphan lines are dropped.
pub fn split_tle_text(text: &str) -> Vec<(Option<&str>, &str, &str)> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();

    let mut entries = Vec::new();
    let mut name: Option<&str> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if line.starts_with("1 ") {
            match lines.get(i + 1) {
                Some(next) if next.starts_with("2 ") => {
                    entries.push((name.take(), line, *next));
                    i += 2;
                }
                _ => {
                    log::trace!("Dropping orphan TLE line: {}", line);
                    name = None;
                    i += 1;
                }
            }
        } else if line.starts_with("2 ") {
            log::trace!("Dropping orphan TLE line: {}", line);
            name = None;
            i += 1;
        } else {
            name = Some(line.trim());
            i += 1;
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::element_set::tests::{ISS_LINE1, ISS_LINE2, ISS_NAME};

    #[test]
    fn test_split_three_line_text() {
        let text = format!(
            "{}\n{}\n{}\n\n{}\n{}\n",
            ISS_NAME, ISS_LINE1, ISS_LINE2, ISS_LINE1, ISS_LINE2
        );
        let entries = split_tle_text(&text);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, Some(ISS_NAME));
        assert_eq!(entries[1].0, None);
        assert_eq!(entries[1].1, ISS_LINE1);
    }

    #[test]
    fn test_split_drops_orphans() {
        // The orphan line 1 is dropped; the name after it still applies
        let text = format!("{}\nNEXT\n{}\n{}\n", ISS_LINE1, ISS_LINE1, ISS_LINE2);
        let entries = split_tle_text(&text);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, Some("NEXT"));
        assert_eq!(entries[0].1, ISS_LINE1);
    }

    #[test]
    fn test_split_orphan_clears_name() {
        let text = format!("ORPHAN\n{}\n{}\n{}\n", ISS_LINE1, ISS_LINE1, ISS_LINE2);
        let entries = split_tle_text(&text);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, None);
    }

    #[test]
    fn test_split_drops_orphan_line_two() {
        let text = format!(
            "STRAY\n{}\n{}\n{}\n{}\n",
            ISS_LINE2, ISS_NAME, ISS_LINE1, ISS_LINE2
        );
        let entries = split_tle_text(&text);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, Some(ISS_NAME));

        let text2 = format!("{}\n{}\n{}\n", ISS_LINE2, ISS_LINE1, ISS_LINE2);
        let entries = split_tle_text(&text2);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, None);
    }

    #[test]
    fn test_split_trailing_orphan() {
        let text = format!("{}\n{}\n{}\n{}\n", ISS_NAME, ISS_LINE1, ISS_LINE2, ISS_LINE1);
        let entries = split_tle_text(&text);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].2, ISS_LINE2);
    }

    #[test]
    fn test_catalog_from_database() {
        let json = format!(
            r#"{{
                "generated_at": "2026-01-29T12:00:00Z",
                "objects": {{
                    "25544": {{
                        "norad_cat_id": 25544,
                        "name": "{}",
                        "tle": {{ "epoch": "2008-09-20", "line1": "{}", "line2": "{}" }}
                    }},
                    "39089": {{ "norad_cat_id": 39089, "name": "SAPPHIRE" }}
                }}
            }}"#,
            ISS_NAME, ISS_LINE1, ISS_LINE2
        );
        let db: CatalogDatabase = serde_json::from_str(&json).unwrap();

        let mut catalog = SatelliteCatalog::new();
        let report = catalog_from_database(&db, &mut catalog);

        assert_eq!(report.loaded, 1);
        assert_eq!(catalog.ids(), vec![25544]);
    }
}
