//! Task hand-off to managed workspaces

pub mod inbox_dispatcher;

pub use inbox_dispatcher::InboxDispatcher;
