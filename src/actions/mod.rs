//! Actions module: the action catalog and its dispatch to the device.

mod catalog;
mod handler;
mod types;

pub use catalog::{Action, ActionError, ActionKind, Catalog, ParamSpec, ParamType};
pub use handler::{ActionHandler, ToolRegistry};
pub use types::{ActionInvocation, ActionResult, ToolDescriptor, ToolOutput};
