//! Camera device enumeration and labeling

pub mod catalog;

pub use catalog::{DeviceCatalog, DeviceDescriptor, DeviceEnumerator, DeviceKind, RawDeviceInfo};
