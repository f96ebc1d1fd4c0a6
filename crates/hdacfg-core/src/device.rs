//! Device identity, device nodes and the firmware interface

use std::cell::OnceCell;
use std::collections::HashMap;
use thiserror::Error;

use crate::value::{Dictionary, Value};

/// Node property holding the firmware path of the device
pub const ACPI_PATH_PROPERTY: &str = "acpi-path";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FirmwareError {
    #[error("Method {method} not found on {path}")]
    MethodNotFound { path: String, method: String },
}

/// Codec identity as reported by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodecIdentity {
    /// `vendor << 16 | codec`
    pub codec_vendor_id: u32,
    /// `subsystem vendor << 16 | subsystem device`
    pub subsystem_id: u32,
}

impl CodecIdentity {
    pub fn new(codec_vendor_id: u32, subsystem_id: u32) -> Self {
        Self {
            codec_vendor_id,
            subsystem_id,
        }
    }

    pub fn vendor(&self) -> u16 {
        (self.codec_vendor_id >> 16) as u16
    }

    pub fn codec(&self) -> u16 {
        self.codec_vendor_id as u16
    }

    pub fn subsystem_vendor(&self) -> u16 {
        (self.subsystem_id >> 16) as u16
    }

    pub fn subsystem_device(&self) -> u16 {
        self.subsystem_id as u16
    }
}

impl std::fmt::Display for CodecIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08x}/0x{:08x}", self.codec_vendor_id, self.subsystem_id)
    }
}

/// A node in the device tree with its properties and override cache
#[derive(Debug, Default)]
pub struct DeviceNode {
    properties: Dictionary,
    /// Translated firmware override; written at most once, read thereafter
    override_cache: OnceCell<Dictionary>,
}

impl DeviceNode {
    pub fn new(properties: Dictionary) -> Self {
        Self {
            properties,
            override_cache: OnceCell::new(),
        }
    }

    /// Create a node that only carries a firmware path
    pub fn with_acpi_path(path: &str) -> Self {
        let mut properties = Dictionary::new();
        properties.insert(ACPI_PATH_PROPERTY.to_string(), Value::from(path));
        Self::new(properties)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn acpi_path(&self) -> Option<&str> {
        self.property(ACPI_PATH_PROPERTY).and_then(Value::as_str)
    }

    /// Previously cached override, if any
    pub fn cached_override(&self) -> Option<&Dictionary> {
        self.override_cache.get()
    }

    /// Cache an override; the first write wins and later writes are ignored
    pub fn cache_override(&self, dict: Dictionary) -> &Dictionary {
        self.override_cache.get_or_init(|| dict)
    }
}

/// Source of a codec's identity and its controller's device node
pub trait CodecDevice {
    fn codec_vendor_id(&self) -> u32;
    fn subsystem_id(&self) -> u32;
    /// Device node of the controller the codec hangs off
    fn pci_device(&self) -> &DeviceNode;

    fn identity(&self) -> CodecIdentity {
        CodecIdentity::new(self.codec_vendor_id(), self.subsystem_id())
    }
}

/// A firmware device that can evaluate methods
pub trait AcpiDevice {
    fn evaluate(&self, method: &str) -> Result<Value, FirmwareError>;
}

/// Platform services used while assembling a configuration
pub trait Platform {
    /// Resolve a firmware path to a device handle
    fn acpi_device(&self, path: &str) -> Option<&dyn AcpiDevice>;
    /// Whether another audio driver that performs its own codec reset is loaded
    fn alternate_driver_present(&self) -> bool;
}

/// Firmware device backed by a fixed table of method results
#[derive(Debug, Clone, Default)]
pub struct StaticAcpiDevice {
    path: String,
    methods: HashMap<String, Value>,
}

impl StaticAcpiDevice {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            methods: HashMap::new(),
        }
    }

    /// Register the value a method evaluates to
    pub fn with_method(mut self, method: &str, result: Value) -> Self {
        self.methods.insert(method.to_string(), result);
        self
    }
}

impl AcpiDevice for StaticAcpiDevice {
    fn evaluate(&self, method: &str) -> Result<Value, FirmwareError> {
        self.methods
            .get(method)
            .cloned()
            .ok_or_else(|| FirmwareError::MethodNotFound {
                path: self.path.clone(),
                method: method.to_string(),
            })
    }
}

/// Platform backed by in-memory firmware devices
#[derive(Debug, Clone, Default)]
pub struct StaticPlatform {
    devices: HashMap<String, StaticAcpiDevice>,
    alternate_driver: bool,
}

impl StaticPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&mut self, device: StaticAcpiDevice) {
        self.devices.insert(device.path.clone(), device);
    }

    pub fn set_alternate_driver(&mut self, present: bool) {
        self.alternate_driver = present;
    }
}

impl Platform for StaticPlatform {
    fn acpi_device(&self, path: &str) -> Option<&dyn AcpiDevice> {
        self.devices.get(path).map(|d| d as &dyn AcpiDevice)
    }

    fn alternate_driver_present(&self) -> bool {
        self.alternate_driver
    }
}

/// Codec with a fixed identity, attached to an owned controller node
#[derive(Debug)]
pub struct StaticCodec {
    pub identity: CodecIdentity,
    pub controller: DeviceNode,
}

impl StaticCodec {
    pub fn new(identity: CodecIdentity, controller: DeviceNode) -> Self {
        Self {
            identity,
            controller,
        }
    }
}

impl CodecDevice for StaticCodec {
    fn codec_vendor_id(&self) -> u32 {
        self.identity.codec_vendor_id
    }

    fn subsystem_id(&self) -> u32 {
        self.identity.subsystem_id
    }

    fn pci_device(&self) -> &DeviceNode {
        &self.controller
    }
}
