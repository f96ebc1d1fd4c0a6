//! Codec profile lookup and merging
//!
//! A profile table maps identity-derived keys to profiles. Keys are tried
//! from most to least specific:
//! 1. `vvvv_cccc_HDA_ssss_dddd` (vendor, codec, subsystem vendor and device)
//! 2. `vvvv_cccc_HDA_ssss` (vendor, codec, subsystem vendor)
//! 3. `vvvv_cccc` (vendor, codec)
//! 4. `vvvv` (vendor only, used for e.g. Intel HDMI)
//!
//! A string entry is an alias for another top-level key, followed once.
//! The `Default` profile is merged underneath whatever was located.

use tracing::debug;

use crate::device::CodecIdentity;
use crate::value::{merge, Dictionary, Value};

/// Key of the profile merged underneath every located profile
pub const DEFAULT_PROFILE: &str = "Default";

/// Lookup keys for a codec, most specific first
pub fn candidate_keys(identity: CodecIdentity) -> [String; 4] {
    let vendor = identity.vendor();
    let codec = identity.codec();
    let sub_vendor = identity.subsystem_vendor();
    let sub_device = identity.subsystem_device();
    [
        format!("{:04x}_{:04x}_HDA_{:04x}_{:04x}", vendor, codec, sub_vendor, sub_device),
        format!("{:04x}_{:04x}_HDA_{:04x}", vendor, codec, sub_vendor),
        format!("{:04x}_{:04x}", vendor, codec),
        format!("{:04x}", vendor),
    ]
}

/// Find the most specific profile for a codec, following one alias level
///
/// The first key present decides: an alias to a missing or non-dictionary
/// target yields `None` rather than falling back to a less specific key.
pub fn locate(profiles: &Dictionary, identity: CodecIdentity) -> Option<&Dictionary> {
    let (key, entry) = candidate_keys(identity)
        .into_iter()
        .find_map(|key| profiles.get(&key).map(|entry| (key, entry)))?;

    match entry {
        Value::String(alias) => {
            debug!(key = %key, alias = %alias, "Following profile alias");
            profiles.get(alias).and_then(Value::as_dict)
        }
        other => {
            debug!(key = %key, "Located codec profile");
            other.as_dict()
        }
    }
}

/// Build the resolved profile: `Default` with the located profile on top
///
/// Always returns a fresh dictionary; the table itself is never modified.
pub fn load(profiles: Option<&Dictionary>, identity: CodecIdentity) -> Dictionary {
    let (default_profile, codec_profile) = match profiles {
        Some(table) => (
            table.get(DEFAULT_PROFILE).and_then(Value::as_dict),
            locate(table, identity),
        ),
        None => (None, None),
    };

    match (default_profile, codec_profile) {
        (Some(default_profile), Some(codec_profile)) => {
            let mut result = default_profile.clone();
            merge(&mut result, codec_profile);
            result
        }
        (Some(default_profile), None) => default_profile.clone(),
        (None, Some(codec_profile)) => codec_profile.clone(),
        (None, None) => {
            debug!(codec = %identity, "No profile found, using empty configuration");
            Dictionary::new()
        }
    }
}
