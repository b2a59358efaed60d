//! Build script for ledgate-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates board.toml and turns it into a `BoardConfig` constant

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// GPIOs usable for LEDs and buttons (GPIO0/1 carry the host link)
const BANK_PINS: std::ops::RangeInclusive<i64> = 2..=29;

const LED_COUNT: usize = 2;
const BUTTON_COUNT: usize = 4;

fn main() {
    setup_linker();
    generate_board_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    if env::var_os("CARGO_FEATURE_DEFMT").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

struct Led {
    label: String,
    pin: i64,
}

struct Button {
    label: String,
    pin: i64,
    led: usize,
    on: bool,
    notify: bool,
}

/// Validate board.toml and write `board_config.rs` into OUT_DIR
fn generate_board_config() {
    println!("cargo:rerun-if-changed=board.toml");

    let config_path = Path::new("board.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a board.toml wiring file.                 ║\n\
            ║  Please create one in the ledgate-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read board.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in board.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();

    let debounce_ms = parse_debounce(&config, &mut errors);
    let trigger = parse_trigger(&config, &mut errors);
    let leds = parse_leds(&config, &mut errors);
    let buttons = parse_buttons(&config, &leds, &mut errors);
    check_wiring(&leds, &buttons, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid board configuration                              ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let source = render(&leds, &buttons, debounce_ms, trigger);
    fs::write(out_dir.join("board_config.rs"), source).unwrap();

    println!("cargo:warning=board.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_debounce(config: &toml::Value, errors: &mut Vec<String>) -> i64 {
    match config.get("debounce_ms") {
        None => 200,
        Some(toml::Value::Integer(ms)) if *ms > 0 && *ms <= i64::from(u32::MAX) => *ms,
        Some(_) => {
            errors.push("debounce_ms must be a positive integer".to_string());
            0
        }
    }
}

fn parse_trigger(config: &toml::Value, errors: &mut Vec<String>) -> &'static str {
    match config.get("trigger").and_then(|t| t.as_str()).unwrap_or("rising") {
        "rising" => "Rising",
        "falling" => "Falling",
        "both" => "Both",
        _ => {
            errors.push("trigger must be 'rising', 'falling', or 'both'".to_string());
            "Rising"
        }
    }
}

fn parse_pin(section: &str, table: &toml::value::Table, errors: &mut Vec<String>) -> i64 {
    match table.get("pin") {
        Some(toml::Value::Integer(pin)) => {
            if !BANK_PINS.contains(pin) {
                errors.push(format!("{} pin {} is not GPIO2-GPIO29", section, pin));
            }
            *pin
        }
        Some(_) => {
            errors.push(format!("{} 'pin' must be an integer", section));
            -1
        }
        None => {
            errors.push(format!("{} missing 'pin'", section));
            -1
        }
    }
}

fn parse_label(section: &str, table: &toml::value::Table, errors: &mut Vec<String>) -> String {
    match table.get("label").and_then(|l| l.as_str()) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => {
            errors.push(format!("{} missing 'label'", section));
            section.to_string()
        }
    }
}

fn tables<'a>(
    config: &'a toml::Value,
    key: &str,
    expected: usize,
    errors: &mut Vec<String>,
) -> Vec<&'a toml::value::Table> {
    let entries = match config.get(key) {
        Some(toml::Value::Array(entries)) => entries,
        _ => {
            errors.push(format!("Missing [[{}]] entries", key));
            return Vec::new();
        }
    };
    if entries.len() != expected {
        errors.push(format!(
            "Exactly {} [[{}]] entries required, found {}",
            expected,
            key,
            entries.len()
        ));
    }
    entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| match entry {
            toml::Value::Table(t) => Some(t),
            _ => {
                errors.push(format!("[[{}]] #{} must be a table", key, i + 1));
                None
            }
        })
        .collect()
}

fn parse_leds(config: &toml::Value, errors: &mut Vec<String>) -> Vec<Led> {
    tables(config, "led", LED_COUNT, errors)
        .into_iter()
        .enumerate()
        .map(|(i, led)| {
            let section = format!("[[led]] #{}", i + 1);
            Led {
                label: parse_label(&section, led, errors),
                pin: parse_pin(&section, led, errors),
            }
        })
        .collect()
}

fn parse_buttons(config: &toml::Value, leds: &[Led], errors: &mut Vec<String>) -> Vec<Button> {
    tables(config, "button", BUTTON_COUNT, errors)
        .into_iter()
        .enumerate()
        .map(|(i, button)| {
            let section = format!("[[button]] #{}", i + 1);
            let label = parse_label(&section, button, errors);
            let pin = parse_pin(&section, button, errors);

            let led = match button.get("led").and_then(|l| l.as_str()) {
                Some(name) => match leds.iter().position(|l| l.label == name) {
                    Some(index) => index,
                    None => {
                        errors.push(format!("{} refers to unknown LED '{}'", section, name));
                        0
                    }
                },
                None => {
                    errors.push(format!("{} missing 'led'", section));
                    0
                }
            };

            let on = match button.get("action").and_then(|a| a.as_str()) {
                Some("on") => true,
                Some("off") => false,
                _ => {
                    errors.push(format!("{} action must be 'on' or 'off'", section));
                    true
                }
            };

            let notify = match button.get("notify") {
                None => false,
                Some(toml::Value::Boolean(b)) => *b,
                Some(_) => {
                    errors.push(format!("{} 'notify' must be true or false", section));
                    false
                }
            };

            Button {
                label,
                pin,
                led,
                on,
                notify,
            }
        })
        .collect()
}

fn check_wiring(leds: &[Led], buttons: &[Button], errors: &mut Vec<String>) {
    let pins: Vec<(&str, i64)> = leds
        .iter()
        .map(|l| (l.label.as_str(), l.pin))
        .chain(buttons.iter().map(|b| (b.label.as_str(), b.pin)))
        .collect();
    for (i, (label, pin)) in pins.iter().enumerate() {
        if let Some((other, _)) = pins[i + 1..].iter().find(|(_, p)| p == pin) {
            errors.push(format!("GPIO{} used by both {} and {}", pin, label, other));
        }
    }

    for (i, led) in leds.iter().enumerate() {
        let controlled = |on: bool| buttons.iter().any(|b| b.led == i && b.on == on);
        if !controlled(true) {
            errors.push(format!("LED {} has no button with action = \"on\"", led.label));
        }
        if !controlled(false) {
            errors.push(format!("LED {} has no button with action = \"off\"", led.label));
        }
    }
}

fn render(leds: &[Led], buttons: &[Button], debounce_ms: i64, trigger: &str) -> String {
    let mut out = String::new();
    out.push_str("/// Board wiring generated from board.toml\n");
    out.push_str("pub const BOARD: BoardConfig = BoardConfig {\n    leds: [\n");
    for led in leds {
        out.push_str(&format!(
            "        LedConfig {{ label: {:?}, pin: PinId({}) }},\n",
            led.label, led.pin
        ));
    }
    out.push_str("    ],\n    buttons: [\n");
    for button in buttons {
        out.push_str(&format!(
            "        ButtonConfig {{ label: {:?}, pin: PinId({}), led: LedId({}), action: LedAction::{}, notify: {} }},\n",
            button.label,
            button.pin,
            button.led,
            if button.on { "ForceOn" } else { "ForceOff" },
            button.notify
        ));
    }
    out.push_str(&format!(
        "    ],\n    debounce_ms: {},\n    trigger: Edge::{},\n}};\n",
        debounce_ms, trigger
    ));
    out
}
