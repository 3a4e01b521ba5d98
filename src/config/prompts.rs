//! System prompt for the agent.

use chrono::Local;

use crate::actions::{ActionKind, Catalog};
use crate::adb::ScreenSize;

/// Operating strategy appended after the screen description.
pub const STRATEGY: &str = "Strategy:
1. Always start by taking a screenshot to see the current state.
2. Decide on one action at a time.
3. After each action, take another screenshot to verify the result.
4. When the task is complete, call the `done` tool with a summary.

Be precise with coordinates. Look carefully at the screenshot to identify \
where UI elements are before tapping.";

/// Build the system prompt for a screen and the catalog the oracle is offered.
pub fn get_system_prompt(screen: ScreenSize, catalog: &Catalog) -> String {
    let today = Local::now().format("%B %d, %Y");
    let actions: Vec<&str> = catalog
        .kinds()
        .iter()
        .filter(|kind| !matches!(kind, ActionKind::Screenshot | ActionKind::Done))
        .map(|kind| kind.name())
        .collect();

    format!(
        "You are an Android phone operator. You can see the screen via screenshots and \
interact using {}.

Today's date is: {}
Screen coordinates are in pixels. The screen is {}x{}.

{}",
        join_actions(&actions),
        today,
        screen.width,
        screen.height,
        STRATEGY
    )
}

fn join_actions(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => only.to_string(),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}
