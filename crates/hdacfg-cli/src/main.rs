//! hdacfg - Resolve the codec configuration for a device identity
//!
//! Loads a profile table and an optional firmware override package from
//! property lists, assembles the configuration the driver would use for the
//! given codec and prints it.

mod config;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use hdacfg_core::overrides::OVERRIDE_METHOD;
use hdacfg_core::profile::candidate_keys;
use hdacfg_core::{
    parse_integer, plist, CodecIdentity, Configuration, CustomCommand, DeviceNode, Dictionary,
    StaticAcpiDevice, StaticCodec, StaticPlatform,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "hdacfg")]
#[command(about = "Resolve codec profiles and firmware overrides into a codec configuration")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "hdacfg.toml")]
    config: PathBuf,

    /// Codec vendor id (vendor << 16 | codec), hex or decimal
    #[arg(long, value_parser = parse_id)]
    codec: u32,

    /// Subsystem id (subsystem vendor << 16 | device), hex or decimal
    #[arg(long, value_parser = parse_id, default_value = "0")]
    subsystem: u32,

    /// Property list holding the profile table
    #[arg(short, long)]
    profiles: Option<PathBuf>,

    /// Property list with the firmware override package
    #[arg(short, long = "override")]
    override_path: Option<PathBuf>,

    /// Driver name used to select the override
    #[arg(short, long)]
    name: Option<String>,

    /// Only list custom commands that apply to this layout id
    #[arg(long, allow_hyphen_values = true)]
    layout: Option<i32>,

    /// Print the configuration as JSON
    #[arg(long)]
    json: bool,

    /// Print the profile lookup keys and exit
    #[arg(long)]
    candidates: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

/// Parse an id with the profile integer syntax, rejecting garbage
fn parse_id(text: &str) -> Result<u32, String> {
    let value = parse_integer(text);
    let digits = text.trim_start_matches(' ');
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    if value == 0 && !digits.chars().all(|c| c == '0') {
        return Err(format!("invalid id {:?}", text));
    }
    Ok(value)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let identity = CodecIdentity::new(args.codec, args.subsystem);

    if args.candidates {
        for key in candidate_keys(identity) {
            println!("{}", key);
        }
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;

    // Command line takes precedence over the config file
    if let Some(path) = args.profiles {
        config.profiles.path = Some(path);
    }
    if let Some(path) = args.override_path {
        config.firmware.override_path = Some(path);
    }
    if let Some(name) = args.name {
        config.driver.name = name;
    }

    let profiles = load_profiles(&config.profiles)?;
    let platform = build_platform(&config)?;
    let codec = StaticCodec::new(
        identity,
        DeviceNode::with_acpi_path(&config.firmware.acpi_path),
    );

    info!(codec = %identity, name = %config.driver.name, "Assembling configuration");

    let configuration = Configuration::load(profiles.as_ref(), &codec, &platform, &config.driver.name)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&configuration)?);
    } else {
        print_configuration(identity, &configuration, args.layout);
    }

    Ok(())
}

/// Load the profile table, if one is configured
fn load_profiles(profiles: &config::ProfilesConfig) -> Result<Option<Dictionary>> {
    let Some(path) = &profiles.path else {
        return Ok(None);
    };

    let root = plist::from_file(path)
        .with_context(|| format!("Failed to load profiles from {}", path.display()))?;
    let table = plist::value_at_path(&root, &profiles.key_path)
        .and_then(|v| v.as_dict())
        .ok_or_else(|| {
            anyhow!(
                "No profile dictionary at {:?} in {}",
                profiles.key_path.join(" / "),
                path.display()
            )
        })?;

    info!(path = %path.display(), profiles = table.len(), "Loaded profile table");
    Ok(Some(table.clone()))
}

/// Firmware with the configured override package, if any
fn build_platform(config: &config::Config) -> Result<StaticPlatform> {
    let mut platform = StaticPlatform::new();
    platform.set_alternate_driver(config.driver.alternate_driver_present);

    let mut device = StaticAcpiDevice::new(&config.firmware.acpi_path);
    if let Some(path) = &config.firmware.override_path {
        let package = plist::from_file(path)
            .with_context(|| format!("Failed to load override from {}", path.display()))?;
        device = device.with_method(OVERRIDE_METHOD, package);
    }
    platform.add_device(device);

    Ok(platform)
}

fn print_configuration(identity: CodecIdentity, config: &Configuration, layout: Option<i32>) {
    println!("Codec {}", identity);

    if config.disable {
        println!("  Disabled");
        return;
    }

    println!("  Codec Address Mask: 0x{:x}", config.codec_address_mask);
    println!("  Send Delay: {} ms", config.send_delay);
    println!("  Perform Reset: {}", config.perform_reset);
    println!(
        "  Perform Reset on External Wake: {}",
        config.perform_reset_on_external_wake
    );
    println!(
        "  Perform Reset on EAPD Fail: {}",
        config.perform_reset_on_eapd_fail
    );
    println!("  Update Nodes: {}", config.update_nodes);
    println!("  Sleep Nodes: {}", config.sleep_nodes);
    println!("  Check Infinitely: {}", config.check_infinite);
    println!("  Check Interval: {} ms", config.check_interval);

    if let Some(pins) = &config.pin_config_default {
        println!("  PinConfigDefault: {} entries", pins.len());
    }

    let commands: Vec<&CustomCommand> = config
        .custom_commands
        .iter()
        .filter(|c| layout.map_or(true, |id| c.matches_layout(id)))
        .collect();
    println!("  Custom Commands: {}", commands.len());
    for command in commands {
        let verbs: Vec<String> = command
            .commands
            .iter()
            .map(|v| format!("0x{:08x}", v))
            .collect();
        println!("    - {}", verbs.join(" "));
        println!(
            "      init={} sleep={} wake={} layout={}",
            command.on_init, command.on_sleep, command.on_wake, command.layout_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("0x10ec0255"), Ok(0x10ec_0255));
        assert_eq!(parse_id("42"), Ok(42));
        assert_eq!(parse_id("0"), Ok(0));
        assert_eq!(parse_id("0x0000"), Ok(0));
        assert!(parse_id("0xZZ").is_err());
        assert!(parse_id("abc").is_err());
    }

    #[test]
    fn test_load_profiles_with_key_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "<plist><dict><key>Codec Profile</key><dict><key>Default</key><dict/></dict></dict></plist>"
        )
        .unwrap();

        let profiles = config::ProfilesConfig {
            path: Some(file.path().to_path_buf()),
            key_path: vec!["Codec Profile".to_string()],
        };
        let table = load_profiles(&profiles).unwrap().unwrap();
        assert!(table.contains_key("Default"));

        let wrong = config::ProfilesConfig {
            path: Some(file.path().to_path_buf()),
            key_path: vec!["Missing".to_string()],
        };
        assert!(load_profiles(&wrong).is_err());
    }

    #[test]
    fn test_end_to_end_with_override() {
        let mut profiles = tempfile::NamedTempFile::new().unwrap();
        write!(
            profiles,
            r#"<plist><dict>
                <key>Default</key><dict><key>Send Delay</key><integer>300</integer></dict>
                <key>10ec_0255</key><dict><key>Send Delay</key><integer>10</integer></dict>
            </dict></plist>"#
        )
        .unwrap();

        let mut rmcf = tempfile::NamedTempFile::new().unwrap();
        write!(
            rmcf,
            r#"<plist><array>
                <string>CodecCommander</string>
                <array>
                    <string>Check Infinitely</string><string>&gt;y</string>
                    <string>Custom Commands</string>
                    <array>
                        <array/>
                        <array>
                            <string>Command</string><data>AUcMAg==</data>
                            <string>On Wake</string><string>&gt;y</string>
                        </array>
                    </array>
                </array>
            </array></plist>"#
        )
        .unwrap();

        let mut config = config::Config::default();
        config.profiles.path = Some(profiles.path().to_path_buf());
        config.profiles.key_path = Vec::new();
        config.firmware.override_path = Some(rmcf.path().to_path_buf());

        let table = load_profiles(&config.profiles).unwrap();
        let platform = build_platform(&config).unwrap();
        let codec = StaticCodec::new(
            CodecIdentity::new(0x10ec_0255, 0),
            DeviceNode::with_acpi_path(&config.firmware.acpi_path),
        );

        let result = Configuration::load(table.as_ref(), &codec, &platform, &config.driver.name).unwrap();
        assert_eq!(result.send_delay, 10);
        assert!(result.check_infinite);
        assert_eq!(result.custom_commands.len(), 1);
        assert_eq!(result.custom_commands[0].commands, vec![0x0147_0c02]);
        assert!(result.custom_commands[0].on_wake);
    }
}
