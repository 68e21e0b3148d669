// Action handlers, one per action name the service answers to

use async_trait::async_trait;

use crate::models::ActionMessage;
use crate::ActionResult;

pub mod add_group;

pub use add_group::{AddGroupHandler, ADD_GROUP_ACTION};

/// A component that reacts to one named action on its channel
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Action name this handler is registered under
    fn action_name(&self) -> &'static str;

    /// Process the action and return the status text sent back to the platform
    async fn handle(&self, message: &ActionMessage) -> ActionResult<String>;
}
