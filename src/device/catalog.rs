//! Device catalog: enumeration boundary and friendly labels
//!
//! Consumes a device-enumeration primitive and produces a filtered,
//! relabeled list limited to video input devices. The front/back relabeling
//! is a best-effort presentation hint from substring matches on the raw
//! label, not a contract.

use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::CaptureError;

/// Kind of an enumerated media device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// One record from the enumeration primitive
#[derive(Debug, Clone)]
pub struct RawDeviceInfo {
    pub device_id: String,
    pub label: String,
    pub kind: DeviceKind,
}

/// One camera input device, immutable once enumerated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Opaque device identifier
    pub device_id: String,
    /// Raw label as reported by the platform
    pub raw_label: String,
    /// Derived human-readable label
    pub label: String,
}

/// Boundary to the platform's device-enumeration primitive
pub trait DeviceEnumerator: Send + Sync {
    fn enumerate(&self) -> BoxFuture<'_, Result<Vec<RawDeviceInfo>, CaptureError>>;
}

/// Derive a friendly label for camera `index` (0-based) from its raw label
fn friendly_label(raw: &str, index: usize) -> String {
    if raw.is_empty() {
        return format!("Camera {}", index + 1);
    }
    let lower = raw.to_lowercase();
    if lower.contains("front") || lower.contains("user") {
        "Selfie camera".to_string()
    } else if lower.contains("back") || lower.contains("environment") {
        "Rear camera".to_string()
    } else {
        raw.to_string()
    }
}

/// Catalog of available camera input devices
pub struct DeviceCatalog {
    enumerator: Arc<dyn DeviceEnumerator>,
    devices: RwLock<Vec<DeviceDescriptor>>,
}

impl DeviceCatalog {
    pub fn new(enumerator: Arc<dyn DeviceEnumerator>) -> Self {
        Self {
            enumerator,
            devices: RwLock::new(Vec::new()),
        }
    }

    /// Re-enumerate, keeping only video inputs. Returns the fresh list.
    pub async fn refresh(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        let raw = self.enumerator.enumerate().await?;
        let cameras: Vec<DeviceDescriptor> = raw
            .into_iter()
            .filter(|d| d.kind == DeviceKind::VideoInput)
            .enumerate()
            .map(|(index, d)| DeviceDescriptor {
                label: friendly_label(&d.label, index),
                device_id: d.device_id,
                raw_label: d.label,
            })
            .collect();

        tracing::info!("Discovered {} camera(s)", cameras.len());
        *self.devices.write() = cameras.clone();
        Ok(cameras)
    }

    /// Snapshot of the last enumeration
    pub fn devices(&self) -> Vec<DeviceDescriptor> {
        self.devices.read().clone()
    }

    /// Look up a device by id
    pub fn find(&self, device_id: &str) -> Option<DeviceDescriptor> {
        self.devices
            .read()
            .iter()
            .find(|d| d.device_id == device_id)
            .cloned()
    }

    /// Cyclic successor of `device_id`, used to hop to the next camera.
    /// Falls back to the first device when the id is unknown.
    pub fn next_after(&self, device_id: &str) -> Option<DeviceDescriptor> {
        let devices = self.devices.read();
        if devices.is_empty() {
            return None;
        }
        match devices.iter().position(|d| d.device_id == device_id) {
            Some(pos) => Some(devices[(pos + 1) % devices.len()].clone()),
            None => Some(devices[0].clone()),
        }
    }
}
