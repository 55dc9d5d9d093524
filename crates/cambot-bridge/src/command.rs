//! `cambot ...` chat commands reading and mutating the shared settings.

use cambot_core::{Settings, SettingsError, SharedSettings};

/// Chat lines are capped by the game; longer replies are split.
const MAX_REPLY_LEN: usize = 200;

/// Replies to send back, and the canonical key that was changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Response {
    pub replies: Vec<String>,
    pub changed: Option<&'static str>,
}

impl Response {
    fn reply(text: impl Into<String>) -> Self {
        Self {
            replies: vec![text.into()],
            changed: None,
        }
    }
}

/// Handles one chat line. Returns `None` when the line is not a command.
pub fn handle(settings: &SharedSettings, message: &str) -> Option<Response> {
    let mut args = message.split_whitespace();
    if !args.next()?.eq_ignore_ascii_case("cambot") {
        return None;
    }
    let key = args.next();
    let value = args.next();

    let response = match (key, value) {
        (None, _) => help(&settings.read()),
        (Some(key), _) if key.eq_ignore_ascii_case("help") => help(&settings.read()),
        (Some(key), value) if key.eq_ignore_ascii_case("verbose") => verbose(settings, value),
        (Some(key), Some(name)) if key.eq_ignore_ascii_case("get") => get(&settings.read(), name),
        (Some(key), None) if key.eq_ignore_ascii_case("get") => {
            Response::reply("cambot usage: cambot get <setting>")
        }
        (Some(key), None) => get(&settings.read(), key),
        (Some(key), Some(value)) => set(settings, key, value),
    };
    Some(response)
}

fn canonical_key(key: &str) -> Option<&'static str> {
    Settings::KEYS
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(key))
}

fn help(settings: &Settings) -> Response {
    let mut replies = vec![
        "cambot usage: cambot <setting> <value> | cambot get <setting> | cambot verbose [on|off]"
            .to_string(),
    ];
    replies.extend(wrap("settings: ", Settings::KEYS.iter().map(ToString::to_string)));
    replies.extend(wrap(
        "current: ",
        Settings::KEYS.iter().filter_map(|key| {
            settings
                .get(key)
                .ok()
                .map(|value| format!("{key}={value}"))
        }),
    ));
    Response {
        replies,
        changed: None,
    }
}

/// Joins `items` with `, ` into lines no longer than [`MAX_REPLY_LEN`].
fn wrap(prefix: &str, items: impl Iterator<Item = String>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = prefix.to_string();
    for item in items {
        if line.len() > prefix.len() && line.len() + item.len() + 2 > MAX_REPLY_LEN {
            lines.push(line);
            line = prefix.to_string();
        }
        if line.len() > prefix.len() {
            line.push_str(", ");
        }
        line.push_str(&item);
    }
    if line.len() > prefix.len() {
        lines.push(line);
    }
    lines
}

fn verbose(settings: &SharedSettings, value: Option<&str>) -> Response {
    let mut settings = settings.write();
    match value {
        None => settings.verbose = !settings.verbose,
        Some(value) => {
            if let Err(err) = settings.set("verbose", value) {
                return Response::reply(error_reply(&err));
            }
        }
    }
    let state = if settings.verbose { "on" } else { "off" };
    tracing::info!(verbose = settings.verbose, "Verbose toggled");
    Response {
        replies: vec![format!("[Cambot] Verbose {state}.")],
        changed: Some("verbose"),
    }
}

fn get(settings: &Settings, key: &str) -> Response {
    let Some(key) = canonical_key(key) else {
        return Response::reply(error_reply(&SettingsError::UnknownKey(key.to_string())));
    };
    match settings.get(key) {
        Ok(value) => Response::reply(format!("{key} = {value}")),
        Err(err) => Response::reply(error_reply(&err)),
    }
}

fn set(settings: &SharedSettings, key: &str, value: &str) -> Response {
    let Some(key) = canonical_key(key) else {
        tracing::warn!(key = %key, "Unknown setting");
        return Response::reply(error_reply(&SettingsError::UnknownKey(key.to_string())));
    };
    match settings.write().set(key, value) {
        Ok(()) => {
            tracing::info!(key = %key, value = %value, "Setting updated");
            Response {
                replies: vec![format!("Camera setting '{key}' updated.")],
                changed: Some(key),
            }
        }
        Err(err) => {
            tracing::warn!(key = %key, value = %value, error = %err, "Setting rejected");
            Response::reply(error_reply(&err))
        }
    }
}

fn error_reply(err: &SettingsError) -> String {
    match err {
        SettingsError::UnknownKey(key) => format!("Unknown setting: '{key}'."),
        SettingsError::InvalidValue { key, expected, .. } => {
            format!("Invalid value for {key}: expected {expected}.")
        }
        other => other.to_string(),
    }
}
