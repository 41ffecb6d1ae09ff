//! Device Registry
//!
//! Sole owner of the set of known wearables and their connection state.
//! Forgotten devices are dropped outright; nothing about them is retained.

use crate::domain::models::{Device, DeviceId, DeviceState};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct Entry {
    device: Device,
    state: DeviceState,
}

#[derive(Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<DeviceId, Entry>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the device was not known before.
    pub fn on_discovered(&self, device: Device) -> bool {
        let mut devices = self.devices.write();
        if devices.contains_key(&device.id) {
            debug!(device = %device.id, "Device rediscovered, already registered");
            return false;
        }
        info!(device = %device.id, name = %device.name, "Device discovered");
        devices.insert(
            device.id.clone(),
            Entry {
                device,
                state: DeviceState::Discovered,
            },
        );
        true
    }

    pub fn on_forgotten(&self, id: &DeviceId) -> Option<Device> {
        let removed = self.devices.write().remove(id).map(|e| e.device);
        match &removed {
            Some(_) => info!(device = %id, "Device forgotten"),
            None => debug!(device = %id, "Forget for unknown device ignored"),
        }
        removed
    }

    /// Returns true when the device is now connected. An unknown device
    /// (typically one forgotten a moment ago) is logged and left alone.
    pub fn on_connected(&self, id: &DeviceId) -> bool {
        let mut devices = self.devices.write();
        match devices.get_mut(id) {
            Some(entry) => {
                if entry.state == DeviceState::Connected {
                    debug!(device = %id, "Duplicate connect notification");
                } else {
                    info!(device = %id, "Device connected");
                }
                entry.state = DeviceState::Connected;
                true
            }
            None => {
                warn!(device = %id, "Connect for unknown device ignored");
                false
            }
        }
    }

    pub fn on_disconnected(&self, id: &DeviceId, cause: &str) -> bool {
        let mut devices = self.devices.write();
        match devices.get_mut(id) {
            Some(entry) => {
                info!(device = %id, cause, "Device disconnected");
                entry.state = DeviceState::Discovered;
                true
            }
            None => {
                debug!(device = %id, cause, "Disconnect for unknown device ignored");
                false
            }
        }
    }

    pub fn on_connect_failed(&self, id: &DeviceId, cause: &str) {
        if self.contains(id) {
            warn!(device = %id, cause, "Connection attempt failed");
        } else {
            debug!(device = %id, cause, "Connection failure for unknown device");
        }
    }

    pub fn state(&self, id: &DeviceId) -> Option<DeviceState> {
        self.devices.read().get(id).map(|e| e.state)
    }

    pub fn contains(&self, id: &DeviceId) -> bool {
        self.devices.read().contains_key(id)
    }

    pub fn get(&self, id: &DeviceId) -> Option<Device> {
        self.devices.read().get(id).map(|e| e.device.clone())
    }

    /// Known devices ordered by identifier
    pub fn devices(&self) -> Vec<(Device, DeviceState)> {
        let mut list: Vec<_> = self
            .devices
            .read()
            .values()
            .map(|e| (e.device.clone(), e.state))
            .collect();
        list.sort_by(|a, b| a.0.id.cmp(&b.0.id));
        list
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}
