//! Firmware-supplied configuration overrides
//!
//! The controller's firmware node may implement a method returning a flat
//! package that translates to a dictionary keyed by driver name. The
//! translated dictionary is cached on the device node, so every driver
//! attached to the same controller shares one evaluation.

use tracing::{debug, info, warn};

use crate::device::{DeviceNode, Platform};
use crate::translate::translate_array;
use crate::value::{Dictionary, Value};

/// Firmware method queried for overrides
pub const OVERRIDE_METHOD: &str = "RMCF";

/// Fetch the override sub-dictionary for the driver called `name`
///
/// Any failure (no firmware path, no method, untranslatable result) means
/// "no override". Failures are not cached, successes are cached once.
pub fn get_override<'a>(
    method: &str,
    platform: &dyn Platform,
    node: &'a DeviceNode,
    name: &str,
) -> Option<&'a Dictionary> {
    let overrides = match node.cached_override() {
        Some(cached) => cached,
        None => node.cache_override(evaluate_override(method, platform, node)?),
    };

    overrides.get(name).and_then(Value::as_dict)
}

fn evaluate_override(method: &str, platform: &dyn Platform, node: &DeviceNode) -> Option<Dictionary> {
    let Some(path) = node.acpi_path() else {
        debug!("Device node has no firmware path, no override");
        return None;
    };
    let Some(device) = platform.acpi_device(path) else {
        debug!(path = %path, "Firmware path does not resolve to a device");
        return None;
    };

    let result = match device.evaluate(method) {
        Ok(result) => result,
        Err(e) => {
            debug!(path = %path, error = %e, "No override from firmware");
            return None;
        }
    };

    let items = match result {
        Value::Array(items) => items,
        other => {
            warn!(method = %method, found = other.type_name(), "Override method must return a package");
            return None;
        }
    };

    match translate_array(&items) {
        Ok(Value::Dict(dict)) => {
            info!(path = %path, method = %method, entries = dict.len(), "Loaded firmware override");
            Some(dict)
        }
        Ok(other) => {
            warn!(found = other.type_name(), "Override must translate to a dictionary");
            None
        }
        Err(e) => {
            warn!(error = %e, "Failed to translate override package");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{AcpiDevice, FirmwareError, StaticAcpiDevice, StaticPlatform};
    use std::cell::Cell;

    const PATH: &str = "\\_SB.PCI0.HDEF";

    fn package() -> Value {
        Value::Array(vec![
            "CodecCommander".into(),
            Value::Array(vec!["Send Delay".into(), Value::Integer(10)]),
            "Other".into(),
            Value::Array(vec!["Disable".into(), ">y".into()]),
        ])
    }

    fn platform_with(result: Value) -> StaticPlatform {
        let mut platform = StaticPlatform::new();
        platform.add_device(StaticAcpiDevice::new(PATH).with_method(OVERRIDE_METHOD, result));
        platform
    }

    #[test]
    fn test_override_for_name() {
        let platform = platform_with(package());
        let node = DeviceNode::with_acpi_path(PATH);

        let custom = get_override(OVERRIDE_METHOD, &platform, &node, "CodecCommander").unwrap();
        assert_eq!(custom["Send Delay"], Value::Integer(10));

        let other = get_override(OVERRIDE_METHOD, &platform, &node, "Other").unwrap();
        assert_eq!(other["Disable"], Value::Bool(true));

        assert!(get_override(OVERRIDE_METHOD, &platform, &node, "Missing").is_none());
    }

    struct CountingDevice {
        calls: Cell<u32>,
    }

    impl AcpiDevice for CountingDevice {
        fn evaluate(&self, _method: &str) -> Result<Value, FirmwareError> {
            self.calls.set(self.calls.get() + 1);
            Ok(package())
        }
    }

    struct CountingPlatform {
        device: CountingDevice,
    }

    impl Platform for CountingPlatform {
        fn acpi_device(&self, path: &str) -> Option<&dyn AcpiDevice> {
            (path == PATH).then_some(&self.device as &dyn AcpiDevice)
        }

        fn alternate_driver_present(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_evaluated_once_per_node() {
        let platform = CountingPlatform {
            device: CountingDevice { calls: Cell::new(0) },
        };
        let node = DeviceNode::with_acpi_path(PATH);

        assert!(get_override(OVERRIDE_METHOD, &platform, &node, "CodecCommander").is_some());
        assert!(get_override(OVERRIDE_METHOD, &platform, &node, "Other").is_some());
        assert!(get_override(OVERRIDE_METHOD, &platform, &node, "Missing").is_none());
        assert_eq!(platform.device.calls.get(), 1);

        // A different node evaluates again
        let second = DeviceNode::with_acpi_path(PATH);
        assert!(get_override(OVERRIDE_METHOD, &platform, &second, "Other").is_some());
        assert_eq!(platform.device.calls.get(), 2);
    }

    #[test]
    fn test_no_acpi_path() {
        let platform = platform_with(package());
        let node = DeviceNode::default();
        assert!(get_override(OVERRIDE_METHOD, &platform, &node, "CodecCommander").is_none());
    }

    #[test]
    fn test_unresolved_path_or_method() {
        let platform = platform_with(package());

        let node = DeviceNode::with_acpi_path("\\_SB.PCI0.NONE");
        assert!(get_override(OVERRIDE_METHOD, &platform, &node, "CodecCommander").is_none());

        let node = DeviceNode::with_acpi_path(PATH);
        assert!(get_override("XXXX", &platform, &node, "CodecCommander").is_none());
        assert!(node.cached_override().is_none());
    }

    #[test]
    fn test_non_package_result() {
        let platform = platform_with(Value::Integer(1));
        let node = DeviceNode::with_acpi_path(PATH);
        assert!(get_override(OVERRIDE_METHOD, &platform, &node, "CodecCommander").is_none());
        assert!(node.cached_override().is_none());
    }

    #[test]
    fn test_array_result_rejected() {
        // Translates fine, but to an array rather than a dictionary
        let platform = platform_with(Value::Array(vec![Value::Array(Vec::new()), "x".into()]));
        let node = DeviceNode::with_acpi_path(PATH);
        assert!(get_override(OVERRIDE_METHOD, &platform, &node, "CodecCommander").is_none());
    }

    #[test]
    fn test_odd_package_rejected() {
        let platform = platform_with(Value::Array(vec!["a".into()]));
        let node = DeviceNode::with_acpi_path(PATH);
        assert!(get_override(OVERRIDE_METHOD, &platform, &node, "a").is_none());
        assert!(node.cached_override().is_none());
    }
}
