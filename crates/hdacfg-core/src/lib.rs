//! hdacfg Core - Codec profile resolution and configuration decoding
//!
//! This crate turns vendor profile tables into a typed codec configuration:
//! - Property-list parsing into a generic value tree
//! - Most-specific-first profile lookup keyed by codec identity
//! - Translation of flat firmware packages into nested values
//! - Firmware override lookup, cached per device node
//! - Decoding of the final configuration and its custom verb commands

pub mod accessor;
pub mod command;
pub mod configuration;
pub mod device;
pub mod overrides;
pub mod plist;
pub mod profile;
pub mod scalar;
pub mod translate;
pub mod value;

pub use command::{CommandEvent, CustomCommand};
pub use configuration::{ConfigError, Configuration};
pub use device::{
    AcpiDevice, CodecDevice, CodecIdentity, DeviceNode, FirmwareError, Platform,
    StaticAcpiDevice, StaticCodec, StaticPlatform,
};
pub use plist::PlistError;
pub use scalar::parse_integer;
pub use translate::{translate_array, translate_entry, TranslateError};
pub use value::{Dictionary, Value};
