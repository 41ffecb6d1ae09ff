//! Course and club-distance stores
//!
//! Both hand out snapshots: whatever a reader gets stays valid and unchanged
//! even if an edit lands right after.

use crate::domain::course::CourseModel;
use crate::domain::equipment::EquipmentSet;
use crate::domain::error::{CourseError, EquipmentError};
use crate::domain::models::GeoPoint;
use parking_lot::RwLock;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub struct CourseStore {
    current: RwLock<Arc<CourseModel>>,
}

impl CourseStore {
    pub fn new(course: CourseModel) -> Self {
        Self {
            current: RwLock::new(Arc::new(course)),
        }
    }

    pub fn snapshot(&self) -> Arc<CourseModel> {
        self.current.read().clone()
    }

    /// Copy-on-write edit of one hole. Readers holding an older snapshot
    /// keep seeing the old points.
    pub fn update_hole(
        &self,
        number: u32,
        front: GeoPoint,
        center: GeoPoint,
        back: GeoPoint,
    ) -> Result<(), CourseError> {
        let mut current = self.current.write();
        let mut next = CourseModel::clone(&current);
        next.update_hole(number, front, center, back)?;
        *current = Arc::new(next);
        info!(hole = number, "Hole coordinates updated");
        Ok(())
    }
}

/// Persisted club distances. Read before every report, written on save.
pub trait EquipmentStore: Send + Sync {
    fn load(&self) -> Result<EquipmentSet, EquipmentError>;
    fn save(&self, equipment: &EquipmentSet) -> Result<(), EquipmentError>;
}

/// JSON blob on disk: `[{"name": ..., "distance": ...}, ...]`
pub struct JsonEquipmentStore {
    path: PathBuf,
}

impl JsonEquipmentStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl EquipmentStore for JsonEquipmentStore {
    fn load(&self) -> Result<EquipmentSet, EquipmentError> {
        // Nothing saved yet reports as an empty bag
        if !self.path.exists() {
            return Ok(EquipmentSet::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, equipment: &EquipmentSet) -> Result<(), EquipmentError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(equipment)?)?;
        Ok(())
    }
}
