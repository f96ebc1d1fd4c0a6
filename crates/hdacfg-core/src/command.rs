//! Custom verb commands sent on codec lifecycle events

use serde::Serialize;
use tracing::warn;

use crate::accessor::{get_bool, get_integer, integer_value};
use crate::value::Value;

pub const KEY_COMMAND: &str = "Command";
pub const KEY_ON_INIT: &str = "On Init";
pub const KEY_ON_SLEEP: &str = "On Sleep";
pub const KEY_ON_WAKE: &str = "On Wake";
pub const KEY_LAYOUT_ID: &str = "LayoutID";

/// Layout id that matches every layout
pub const ANY_LAYOUT: i32 = -1;

/// Size of the packed header: count, three flags, padding, layout id
pub const HEADER_SIZE: usize = 12;

/// Lifecycle event a command can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandEvent {
    Init,
    Sleep,
    Wake,
}

/// A sequence of verbs sent together
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomCommand {
    /// Verb words, in send order
    pub commands: Vec<u32>,
    pub on_init: bool,
    pub on_sleep: bool,
    pub on_wake: bool,
    /// Layout filter, [`ANY_LAYOUT`] when unset
    pub layout_id: i32,
}

impl CustomCommand {
    /// Decode one entry of the `Custom Commands` array
    ///
    /// `Command` is either a non-zero integer (one verb) or a byte buffer of
    /// big-endian verbs. Entries with neither are skipped.
    pub fn from_entry(entry: &Value) -> Option<Self> {
        let Some(dict) = entry.as_dict() else {
            warn!(found = entry.type_name(), "Custom command entry is not a dictionary, skipping");
            return None;
        };

        let command = dict.get(KEY_COMMAND);
        let commands = match integer_value(command, 0) {
            0 => match command {
                Some(Value::Data(bytes)) => words_from_be_bytes(bytes),
                _ => {
                    warn!("Custom command has no usable Command, skipping");
                    return None;
                }
            },
            verb => vec![verb],
        };

        Some(Self {
            commands,
            on_init: get_bool(dict, KEY_ON_INIT, false),
            on_sleep: get_bool(dict, KEY_ON_SLEEP, false),
            on_wake: get_bool(dict, KEY_ON_WAKE, false),
            layout_id: get_integer(dict, KEY_LAYOUT_ID, ANY_LAYOUT as u32) as i32,
        })
    }

    pub fn triggers_on(&self, event: CommandEvent) -> bool {
        match event {
            CommandEvent::Init => self.on_init,
            CommandEvent::Sleep => self.on_sleep,
            CommandEvent::Wake => self.on_wake,
        }
    }

    pub fn matches_layout(&self, layout_id: i32) -> bool {
        self.layout_id == ANY_LAYOUT || self.layout_id == layout_id
    }

    /// Pack into one buffer: header followed by the verb words
    pub fn packed(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.commands.len() * 4);
        buf.extend_from_slice(&(self.commands.len() as u32).to_le_bytes());
        buf.push(self.on_init as u8);
        buf.push(self.on_sleep as u8);
        buf.push(self.on_wake as u8);
        buf.push(0);
        buf.extend_from_slice(&self.layout_id.to_le_bytes());
        for word in &self.commands {
            buf.extend_from_slice(&word.to_le_bytes());
        }
        buf
    }

    /// Unpack a buffer produced by [`CustomCommand::packed`]
    ///
    /// Returns `None` if the length does not match the header's count.
    pub fn from_packed(buf: &[u8]) -> Option<Self> {
        let header = buf.get(..HEADER_SIZE)?;
        let count = u32::from_le_bytes(header[0..4].try_into().ok()?) as usize;
        if buf.len() != HEADER_SIZE + count.checked_mul(4)? {
            return None;
        }

        let commands = buf[HEADER_SIZE..]
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect();

        Some(Self {
            commands,
            on_init: header[4] != 0,
            on_sleep: header[5] != 0,
            on_wake: header[6] != 0,
            layout_id: i32::from_le_bytes(header[8..12].try_into().ok()?),
        })
    }
}

/// Read big-endian 32-bit words; a trailing partial word is ignored
///
/// Authors write verbs left to right (`01 47 0c 02` is `0x01470c02`), so
/// the bytes are assembled explicitly instead of reinterpreted in host order.
pub fn words_from_be_bytes(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
