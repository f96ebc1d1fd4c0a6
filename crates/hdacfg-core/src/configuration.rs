//! Configuration assembly for one codec
//!
//! The effective configuration is built from three layers:
//! 1. The `Default` profile of the profile table
//! 2. The most specific profile located for the codec identity
//! 3. An optional firmware override for this driver
//!
//! Overrides marked with `Version = 0x020600` are merged into a copy of the
//! whole profile table before the lookup, so they may carry per-codec
//! profiles of their own. Any other override is merged on top of the
//! resolved profile.

use serde::Serialize;
use std::collections::TryReserveError;
use thiserror::Error;
use tracing::debug;

use crate::accessor::{get_bool, get_integer};
use crate::command::{CommandEvent, CustomCommand};
use crate::device::{CodecDevice, Platform};
use crate::overrides::{get_override, OVERRIDE_METHOD};
use crate::profile;
use crate::value::{merge, Dictionary, Value};

pub const KEY_DISABLE: &str = "Disable";
pub const KEY_CODEC_ADDRESS_MASK: &str = "CodecAddressMask";
pub const KEY_PERFORM_RESET: &str = "Perform Reset";
pub const KEY_PERFORM_RESET_ON_EXTERNAL_WAKE: &str = "Perform Reset on External Wake";
pub const KEY_PERFORM_RESET_ON_EAPD_FAIL: &str = "Perform Reset on EAPD Fail";
pub const KEY_SEND_DELAY: &str = "Send Delay";
pub const KEY_UPDATE_NODES: &str = "Update Nodes";
pub const KEY_SLEEP_NODES: &str = "Sleep Nodes";
pub const KEY_CHECK_INFINITELY: &str = "Check Infinitely";
pub const KEY_CHECK_INTERVAL: &str = "Check Interval";
pub const KEY_PIN_CONFIG_DEFAULT: &str = "PinConfigDefault";
pub const KEY_CUSTOM_COMMANDS: &str = "Custom Commands";
pub const KEY_VERSION: &str = "Version";

/// Override version that selects merging into the whole profile table
pub const OVERRIDE_TABLE_VERSION: u32 = 0x020600;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to allocate custom command list: {0}")]
    Allocation(#[from] TryReserveError),
}

/// Decoded configuration for one codec
///
/// When `disable` is set every other field is left at its zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Configuration {
    pub disable: bool,
    pub codec_address_mask: u32,
    /// Delay between verbs, in ms
    pub send_delay: u32,
    pub perform_reset: bool,
    pub perform_reset_on_external_wake: bool,
    pub perform_reset_on_eapd_fail: bool,
    pub update_nodes: bool,
    pub sleep_nodes: bool,
    pub check_infinite: bool,
    /// Interval of the EAPD check, in ms
    pub check_interval: u32,
    pub pin_config_default: Option<Vec<Value>>,
    pub custom_commands: Vec<CustomCommand>,
}

impl Configuration {
    /// Assemble the configuration for `codec` as seen by the driver `name`
    pub fn load(
        profiles: Option<&Dictionary>,
        codec: &dyn CodecDevice,
        platform: &dyn Platform,
        name: &str,
    ) -> Result<Self, ConfigError> {
        let identity = codec.identity();
        let mut custom = get_override(OVERRIDE_METHOD, platform, codec.pci_device(), name);

        // Version-marked overrides are merged into a throwaway copy of the table
        let merged_table = match (custom, profiles) {
            (Some(overrides), Some(table)) if is_table_override(overrides) => {
                debug!(name = %name, "Merging override into profile table");
                let mut table = table.clone();
                merge(&mut table, overrides);
                custom = None;
                Some(table)
            }
            _ => None,
        };
        let table = merged_table.as_ref().or(profiles);

        let mut config = profile::load(table, identity);
        if let Some(overrides) = custom {
            debug!(name = %name, "Merging override into codec profile");
            merge(&mut config, overrides);
        }

        let result = Self::from_dictionary(&config, platform.alternate_driver_present())?;
        result.log_summary(name);
        Ok(result)
    }

    /// Decode the typed fields of an effective configuration dictionary
    ///
    /// With `alternate_driver` set, the two reset flags default to false.
    pub fn from_dictionary(config: &Dictionary, alternate_driver: bool) -> Result<Self, ConfigError> {
        if get_bool(config, KEY_DISABLE, false) {
            return Ok(Self {
                disable: true,
                ..Self::default()
            });
        }

        let mut custom_commands = Vec::new();
        let entries = config
            .get(KEY_CUSTOM_COMMANDS)
            .and_then(Value::as_array)
            .unwrap_or_default();
        custom_commands.try_reserve(entries.len())?;
        custom_commands.extend(entries.iter().filter_map(CustomCommand::from_entry));

        Ok(Self {
            disable: false,
            codec_address_mask: get_integer(config, KEY_CODEC_ADDRESS_MASK, 1),
            send_delay: get_integer(config, KEY_SEND_DELAY, 300),
            perform_reset: get_bool(config, KEY_PERFORM_RESET, !alternate_driver),
            perform_reset_on_external_wake: get_bool(
                config,
                KEY_PERFORM_RESET_ON_EXTERNAL_WAKE,
                !alternate_driver,
            ),
            perform_reset_on_eapd_fail: get_bool(config, KEY_PERFORM_RESET_ON_EAPD_FAIL, true),
            update_nodes: get_bool(config, KEY_UPDATE_NODES, true),
            sleep_nodes: get_bool(config, KEY_SLEEP_NODES, true),
            check_infinite: get_bool(config, KEY_CHECK_INFINITELY, false),
            check_interval: get_integer(config, KEY_CHECK_INTERVAL, 1000),
            pin_config_default: config
                .get(KEY_PIN_CONFIG_DEFAULT)
                .and_then(Value::as_array)
                .map(<[Value]>::to_vec),
            custom_commands,
        })
    }

    /// Custom commands to send for `event` on the given layout
    pub fn commands_for(
        &self,
        event: CommandEvent,
        layout_id: i32,
    ) -> impl Iterator<Item = &CustomCommand> {
        self.custom_commands
            .iter()
            .filter(move |c| c.triggers_on(event) && c.matches_layout(layout_id))
    }

    fn log_summary(&self, name: &str) {
        if self.disable {
            debug!(name = %name, "Configuration: disabled");
            return;
        }
        debug!(
            name = %name,
            check_infinite = self.check_infinite,
            check_interval = self.check_interval,
            perform_reset = self.perform_reset,
            perform_reset_on_external_wake = self.perform_reset_on_external_wake,
            perform_reset_on_eapd_fail = self.perform_reset_on_eapd_fail,
            send_delay = self.send_delay,
            update_nodes = self.update_nodes,
            sleep_nodes = self.sleep_nodes,
            "Configuration"
        );
        for command in &self.custom_commands {
            debug!(
                count = command.commands.len(),
                commands = ?command.commands,
                on_init = command.on_init,
                on_wake = command.on_wake,
                on_sleep = command.on_sleep,
                layout_id = command.layout_id,
                "Custom command"
            );
        }
    }
}

fn is_table_override(overrides: &Dictionary) -> bool {
    overrides.get(KEY_VERSION).and_then(Value::as_u32) == Some(OVERRIDE_TABLE_VERSION)
}
