//! Layered settings resolution.
//!
//! Precedence, lowest first: compiled defaults, the JSON settings file, then
//! `CHAT_*` variables. A file may set any subset of keys. Objects in the file
//! are laid over the defaults key by key, every other JSON value replaces what
//! it lands on, and `null` leaves the lower layer in place. Numbers from any
//! layer are held to the same ranges.

use std::io::ErrorKind;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{
    CLOSE_TIMEOUT_MS, COMMAND_QUEUE, CONNECT_TIMEOUT_MS, ChatSettings, LogLevel, PING_INTERVAL_MS,
};

/// `~/.chat-session/settings.json`, or under `/tmp` when `HOME` is unset.
pub fn settings_path() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("/tmp"), PathBuf::from)
        .join(".chat-session")
        .join("settings.json")
}

/// Resolve settings from `path` and the process environment.
///
/// A missing file is the same as an empty one. Unreadable files and
/// malformed or mistyped JSON are errors.
pub fn load_settings_from_path(path: &Path) -> Result<ChatSettings> {
    let mut layered = serde_json::to_value(ChatSettings::default())?;

    match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!(path = %path.display(), "applying settings file");
            overlay(&mut layered, serde_json::from_str(&content)?);
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file");
        }
        Err(e) => return Err(e.into()),
    }

    let mut settings: ChatSettings = serde_json::from_value(layered)?;
    settings.connection.enforce_limits();
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Lay `patch` over `base` in place.
pub fn overlay(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(fields), Value::Object(patch)) => {
            for (key, value) in patch.into_iter().filter(|(_, v)| !v.is_null()) {
                match fields.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        let _ = fields.insert(key, value);
                    }
                }
            }
        }
        (slot, patch) => *slot = patch,
    }
}

/// Apply `CHAT_*` overrides from the process environment.
pub fn apply_env_overrides(settings: &mut ChatSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply `CHAT_*` overrides resolved through `lookup`.
///
/// Values that fail to parse or fall outside their range are logged and
/// skipped, leaving the lower layer in effect.
pub fn apply_overrides<F>(settings: &mut ChatSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let vars = Vars { lookup };

    if let Some(v) = vars.get("CHAT_ENDPOINT").filter(|v| !v.is_empty()) {
        settings.endpoint = v;
    }

    let connection = &mut settings.connection;
    vars.set("CHAT_CONNECT_TIMEOUT_MS", &mut connection.connect_timeout_ms, |v| {
        parse_in_range(v, &CONNECT_TIMEOUT_MS)
    });
    vars.set("CHAT_CLOSE_TIMEOUT_MS", &mut connection.close_timeout_ms, |v| {
        parse_in_range(v, &CLOSE_TIMEOUT_MS)
    });
    vars.set("CHAT_PING_INTERVAL_MS", &mut connection.ping_interval_ms, parse_ping_interval);
    vars.set("CHAT_COMMAND_QUEUE", &mut connection.command_queue, |v| {
        parse_in_range(v, &COMMAND_QUEUE)
    });

    vars.set("CHAT_LOG_LEVEL", &mut settings.logging.level, LogLevel::parse);
    vars.set("CHAT_LOG_JSON", &mut settings.logging.json, parse_bool);
}

/// `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`, any case.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a number and accept it only inside `range`.
pub fn parse_in_range<T>(val: &str, range: &RangeInclusive<T>) -> Option<T>
where
    T: FromStr + PartialOrd,
{
    val.trim().parse().ok().filter(|n| range.contains(n))
}

/// `0` (pings off) or a value in [`PING_INTERVAL_MS`].
pub fn parse_ping_interval(val: &str) -> Option<u64> {
    match parse_in_range(val, &(0..=0)) {
        Some(off) => Some(off),
        None => parse_in_range(val, &PING_INTERVAL_MS),
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
    }

    /// Overwrite `slot` when `name` is set and parses.
    fn set<T>(&self, name: &str, slot: &mut T, parse: impl Fn(&str) -> Option<T>) {
        let Some(raw) = self.get(name) else {
            return;
        };
        match parse(&raw) {
            Some(value) => *slot = value,
            None => warn!(var = name, value = %raw, "ignoring invalid environment override"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
