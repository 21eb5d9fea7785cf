//! Stop-event hook responder.
//!
//! Reads the hook payload from stdin (ignored), checks the
//! `stop_hook_active` environment variable, and prints one JSON decision:
//! approve the stop when the hook is already active (so a blocked stop is
//! only re-prompted once), otherwise block it with a completion checklist.
//! Exits 0 on every path.

use serde::Serialize;
use std::io::Read;

/// Environment variable marking that the stop hook already fired once.
const ACTIVE_FLAG: &str = "stop_hook_active";

const BLOCK_REASON: &str = "Before stopping, please:\n\
    1. Verify all tasks are complete\n\
    2. Summarize what you've accomplished\n\
    3. Mention any remaining work or next steps\n\
    4. If everything is done, confirm completion";

#[derive(Debug, Serialize)]
struct HookOutput {
    decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

/// The stop decision: approve when the hook is already active, block once
/// otherwise. Pure function of the flag.
fn decide(hook_active: bool) -> HookOutput {
    if hook_active {
        HookOutput {
            decision: "approve",
            reason: None,
        }
    } else {
        HookOutput {
            decision: "block",
            reason: Some(BLOCK_REASON),
        }
    }
}

/// Parse the boolean-like flag value: true iff it lowercases to "true".
fn flag_is_true(value: Option<&str>) -> bool {
    value.map(|v| v.to_lowercase() == "true").unwrap_or(false)
}

fn main() {
    // The payload is reserved for future transcript inspection; a read
    // failure is the same as empty input.
    let mut payload = String::new();
    let _ = std::io::stdin().read_to_string(&mut payload);

    let active = flag_is_true(std::env::var(ACTIVE_FLAG).ok().as_deref());
    let output = decide(active);

    // serde_json cannot fail on this struct; fall back to the approve
    // literal rather than emitting nothing.
    let line = serde_json::to_string(&output)
        .unwrap_or_else(|_| r#"{"decision": "approve"}"#.to_string());
    println!("{line}");
}
