//! JSON-RPC method names

/// Prefix shared by every action channel method, e.g. `actions.addgroup`
pub const ACTION_CHANNEL_PREFIX: &str = "actions.";

/// Submit a function event and return its result
pub const SUBMIT_FUNCTION: &str = "functions/submit";

/// List the shipped function definitions
pub const LIST_FUNCTIONS: &str = "functions/definitions";

/// True if `method` names an action channel
pub fn is_action_channel(method: &str) -> bool {
    method
        .strip_prefix(ACTION_CHANNEL_PREFIX)
        .is_some_and(|queue| !queue.is_empty())
}
