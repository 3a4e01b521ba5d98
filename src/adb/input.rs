//! Text and key input helpers.

/// Placeholder the device input method maps back to a space.
pub const SPACE_TOKEN: &str = "%s";

/// Characters the device shell would otherwise interpret.
pub const SHELL_METACHARACTERS: &[char] = &['\'', '"', '&', '|', ';', '(', ')', '<', '>', '`'];

/// Escape text for `input text`.
///
/// Backslashes are doubled first, spaces become [`SPACE_TOKEN`] and every
/// [`SHELL_METACHARACTERS`] entry gets a single backslash prefix. The input is
/// walked once, so backslashes added here are never escaped again.
pub fn escape_input_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ' ' => escaped.push_str(SPACE_TOKEN),
            c if SHELL_METACHARACTERS.contains(&c) => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// Keycode for a symbolic key name, ignoring case.
pub fn keycode_for(name: &str) -> Option<&'static str> {
    let code = match name.to_ascii_lowercase().as_str() {
        "enter" => "66",
        "backspace" => "67",
        "delete" => "112",
        "tab" => "61",
        "space" => "62",
        "home" => "3",
        "back" => "4",
        "menu" => "82",
        "search" => "84",
        "volume_up" => "24",
        "volume_down" => "25",
        "power" => "26",
        "escape" => "111",
        _ => return None,
    };
    Some(code)
}

/// Symbolic names accepted by [`keycode_for`].
pub const KEY_NAMES: &[&str] = &[
    "enter",
    "backspace",
    "delete",
    "tab",
    "space",
    "home",
    "back",
    "menu",
    "search",
    "volume_up",
    "volume_down",
    "power",
    "escape",
];

/// Argument for `input keyevent`: the table keycode, or the name verbatim.
pub fn resolve_key(key: &str) -> String {
    keycode_for(key)
        .map(str::to_string)
        .unwrap_or_else(|| key.to_string())
}
