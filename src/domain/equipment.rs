use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentEntry {
    pub name: String,
    /// Carry distance in yards
    #[serde(default)]
    pub distance: f64,
}

impl EquipmentEntry {
    pub fn new(name: impl Into<String>, distance: f64) -> Self {
        Self {
            name: name.into(),
            distance,
        }
    }
}

/// Club distances in display order. Names act as keys for lookups and
/// updates, but duplicates are tolerated and the first one wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentSet {
    entries: Vec<EquipmentEntry>,
}

impl EquipmentSet {
    pub fn new(entries: Vec<EquipmentEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&EquipmentEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Update the first entry with this name, or append a new one.
    pub fn set_distance(&mut self, name: &str, distance: f64) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.distance = distance,
            None => self.entries.push(EquipmentEntry::new(name, distance)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &EquipmentEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
