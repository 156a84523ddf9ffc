//! Reversible scene mutations.
//!
//! Every change that should be undoable goes through a command executed by
//! the [`CommandHistory`](crate::history::CommandHistory).

mod add_node;
mod command;
mod move_node;
mod remove_node;
mod set_name;
mod set_property;
mod snapshot;

pub use add_node::AddNodeCommand;
pub use command::{Command, CommandKey, CommandKind, SceneCommand};
pub use move_node::MoveNodeCommand;
pub use remove_node::RemoveNodeCommand;
pub use set_name::SetNameCommand;
pub use set_property::SetPropertyCommand;
pub use snapshot::{CommandData, CommandSnapshot};
