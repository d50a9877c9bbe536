//! Named AHAP resources, looked up by `play(file_name, ..)`.

use std::fs;
use std::path::Path;

use hashbrown::HashMap;
use log::{debug, warn};

use crate::ahap::{parse_ahap_json, AhapDocument, AHAP_EXTENSION};
use crate::error::HapticsError;

/// Pattern documents keyed by resource name. Names are stored without the
/// `.ahap` extension, and lookups accept either form.
#[derive(Clone, Debug, Default)]
pub struct PatternLibrary {
    items: HashMap<String, AhapDocument>,
}

fn normalize(name: &str) -> &str {
    name.strip_suffix(".ahap").unwrap_or(name)
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document.
    pub fn insert(&mut self, name: &str, doc: AhapDocument) {
        self.items.insert(normalize(name).to_string(), doc);
    }

    pub fn insert_json(&mut self, name: &str, json: &str) -> Result<(), HapticsError> {
        let doc = parse_ahap_json(json)?;
        self.insert(name, doc);
        Ok(())
    }

    /// Load one file; the resource name is the file stem.
    pub fn load_file(&mut self, path: &Path) -> Result<String, HapticsError> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| HapticsError::Io {
                reason: format!("no usable file name in {}", path.display()),
            })?
            .to_string();
        let text = fs::read_to_string(path)?;
        self.insert_json(&name, &text)?;
        debug!("loaded haptic pattern '{name}' from {}", path.display());
        Ok(name)
    }

    /// Load every `*.ahap` file in `dir` (non-recursive). A file that fails to
    /// parse is skipped with a warning. Returns how many were loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, HapticsError> {
        let mut loaded = 0;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(AHAP_EXTENSION) {
                continue;
            }
            match self.load_file(&path) {
                Ok(_) => loaded += 1,
                Err(e) => warn!("skipping {}: {e}", path.display()),
            }
        }
        Ok(loaded)
    }

    pub fn get(&self, name: &str) -> Result<&AhapDocument, HapticsError> {
        self.items
            .get(normalize(name))
            .ok_or_else(|| HapticsError::PatternNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(normalize(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<AhapDocument> {
        self.items.remove(normalize(name))
    }

    /// Resource names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.items.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
