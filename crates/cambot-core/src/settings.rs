//! Named, independently settable runtime parameters.
//!
//! Both control loops read a fresh copy every cycle; the chat command
//! handler writes single fields through [`Settings::set`]. Unknown keys
//! are rejected instead of silently creating new parameters.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Settings handle shared between the controller and the command handler.
pub type SharedSettings = Arc<RwLock<Settings>>;

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("Unknown setting: '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Camera view mode selected by `viewModeMix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Hold position, only turn towards the subject.
    #[default]
    LookAt,
    /// Stand behind the avatar's current facing.
    #[serde(alias = "ots")]
    OverTheShoulder,
    /// Orbit the subject.
    Circle,
    /// Back off along the facing direction for a wide shot.
    Wide,
    /// Pick one of the concrete modes every tick.
    Random,
}

impl ViewMode {
    /// Modes `Random` draws from.
    pub const CONCRETE: [ViewMode; 4] = [
        ViewMode::LookAt,
        ViewMode::OverTheShoulder,
        ViewMode::Circle,
        ViewMode::Wide,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LookAt => "look_at",
            Self::OverTheShoulder => "over_the_shoulder",
            Self::Circle => "circle",
            Self::Wide => "wide",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "look_at" | "lookat" => Ok(Self::LookAt),
            "over_the_shoulder" | "ots" => Ok(Self::OverTheShoulder),
            "circle" => Ok(Self::Circle),
            "wide" => Ok(Self::Wide),
            "random" => Ok(Self::Random),
            _ => Err(()),
        }
    }
}

/// A value type that can be set from a chat command.
trait SettingValue: Sized {
    const KIND: &'static str;

    fn parse_setting(raw: &str) -> Option<Self>;

    fn display_setting(&self) -> String;
}

impl SettingValue for f64 {
    const KIND: &'static str = "a number";

    fn parse_setting(raw: &str) -> Option<Self> {
        raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn display_setting(&self) -> String {
        self.to_string()
    }
}

/// Upper bound for every millisecond setting (one day).
pub const MAX_MILLIS: u64 = 86_400_000;

/// All `u64` settings are durations in milliseconds.
impl SettingValue for u64 {
    const KIND: &'static str = "milliseconds between 0 and 86400000";

    fn parse_setting(raw: &str) -> Option<Self> {
        raw.trim()
            .parse()
            .ok()
            .filter(|millis| *millis <= MAX_MILLIS)
    }

    fn display_setting(&self) -> String {
        self.to_string()
    }
}

impl SettingValue for u32 {
    const KIND: &'static str = "a non-negative integer";

    fn parse_setting(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }

    fn display_setting(&self) -> String {
        self.to_string()
    }
}

impl SettingValue for bool {
    const KIND: &'static str = "on/off";

    fn parse_setting(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "1" | "yes" => Some(true),
            "false" | "off" | "0" | "no" => Some(false),
            _ => None,
        }
    }

    fn display_setting(&self) -> String {
        self.to_string()
    }
}

impl SettingValue for String {
    const KIND: &'static str = "text";

    fn parse_setting(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (!raw.is_empty()).then(|| raw.to_string())
    }

    fn display_setting(&self) -> String {
        self.clone()
    }
}

impl SettingValue for ViewMode {
    const KIND: &'static str = "one of look_at, over_the_shoulder, circle, wide, random";

    fn parse_setting(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }

    fn display_setting(&self) -> String {
        self.to_string()
    }
}

macro_rules! define_settings {
    ($( $(#[$attr:meta])* $field:ident : $ty:ty = $default:expr => $key:literal ),* $(,)?) => {
        /// Runtime parameters of the camera bot.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(default, deny_unknown_fields)]
        pub struct Settings {
            $(
                $(#[$attr])*
                #[serde(rename = $key)]
                pub $field: $ty,
            )*
        }

        impl Default for Settings {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                }
            }
        }

        impl Settings {
            /// Every settable key, in declaration order.
            pub const KEYS: &'static [&'static str] = &[$($key),*];

            /// Replaces one field from its textual form.
            ///
            /// The settings are left untouched when the key is unknown or the
            /// value does not parse.
            pub fn set(&mut self, key: &str, raw: &str) -> Result<(), SettingsError> {
                match key {
                    $(
                        $key => {
                            self.$field = <$ty as SettingValue>::parse_setting(raw).ok_or_else(|| {
                                SettingsError::InvalidValue {
                                    key: key.to_string(),
                                    value: raw.to_string(),
                                    expected: <$ty as SettingValue>::KIND,
                                }
                            })?;
                            Ok(())
                        }
                    )*
                    _ => Err(SettingsError::UnknownKey(key.to_string())),
                }
            }

            /// Current value of one field in textual form.
            pub fn get(&self, key: &str) -> Result<String, SettingsError> {
                match key {
                    $( $key => Ok(SettingValue::display_setting(&self.$field)), )*
                    _ => Err(SettingsError::UnknownKey(key.to_string())),
                }
            }
        }
    };
}

define_settings! {
    /// Gamemode requested once at startup.
    gamemode: String = "spectator".to_string() => "gamemode",
    /// Client view distance in chunks.
    view_distance: u32 = 6 => "viewDistance",
    /// A locked subject farther than this is treated as out of range.
    entity_search_radius: f64 = 120.0 => "entitySearchRadius",
    view_mode: ViewMode = ViewMode::LookAt => "viewModeMix",
    /// Radians added to the orbit angle each tick.
    circle_speed: f64 = 0.15 => "circleSpeed",
    circle_radius: f64 = 8.0 => "circleRadius",
    circle_height_fraction: f64 = 0.6 => "circleHeightFraction",
    over_shoulder_distance: f64 = 6.0 => "overShoulderDistance",
    wide_min_distance: f64 = 12.0 => "wideMinDistance",
    wide_backoff: f64 = 8.0 => "wideBackoff",
    wide_height: f64 = 6.0 => "wideHeight",
    /// Fraction of the subject's height to aim at.
    head_fraction: f64 = 1.0 => "headFraction",
    goal_tolerance: f64 = 1.0 => "goalTolerance",
    /// Weight of the new desired position in the goal moving average.
    smoothing: f64 = 0.35 => "smoothing",
    min_dispatch_interval_ms: u64 = 300 => "minDispatchIntervalMs",
    goal_epsilon: f64 = 0.5 => "goalEpsilon",
    subject_epsilon: f64 = 0.25 => "subjectEpsilon",
    dwell_ms: u64 = 20_000 => "dwellMs",
    poll_ms: u64 = 5_000 => "pollMs",
    verify_timeout_ms: u64 = 2_000 => "verifyTimeoutMs",
    /// Own displacement that proves a relocation happened.
    min_delta: f64 = 3.0 => "minDelta",
    debounce_ms: u64 = 250 => "debounceMs",
    probe_timeout_ms: u64 = 2_000 => "probeTimeoutMs",
    /// Gates status announcements in chat.
    verbose: bool = false => "verbose",
}

/// Environment variable → settings key.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("CAMBOT_TP_DWELL_MS", "dwellMs"),
    ("CAMBOT_TP_POLL_MS", "pollMs"),
    ("CAMBOT_TP_TIMEOUT_MS", "verifyTimeoutMs"),
    ("CAMBOT_TP_MIN_DELTA", "minDelta"),
    ("CAMBOT_VIEW_DISTANCE", "viewDistance"),
    ("CAMBOT_VERBOSE", "verbose"),
];

impl Settings {
    /// Reads a JSON settings file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Applies `CAMBOT_*` overrides from the given variables.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<(), SettingsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in vars {
            if let Some((_, key)) = ENV_OVERRIDES.iter().find(|(env, _)| *env == name.as_ref()) {
                self.set(key, value.as_ref())?;
            }
        }
        Ok(())
    }

    pub fn into_shared(self) -> SharedSettings {
        Arc::new(RwLock::new(self))
    }

    pub fn dwell(&self) -> Duration {
        millis(self.dwell_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        millis(self.poll_ms)
    }

    pub fn verify_timeout(&self) -> Duration {
        millis(self.verify_timeout_ms)
    }

    pub fn debounce(&self) -> Duration {
        millis(self.debounce_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        millis(self.probe_timeout_ms)
    }

    pub fn min_dispatch_interval(&self) -> Duration {
        millis(self.min_dispatch_interval_ms)
    }
}

/// Fields can still be assigned directly or loaded from a file, so the
/// bound is applied again here.
fn millis(value: u64) -> Duration {
    Duration::from_millis(value.min(MAX_MILLIS))
}
