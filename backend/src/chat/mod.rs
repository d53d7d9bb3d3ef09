//! Chat module
//!
//! Chat records, the typed view over the `chats` storage namespace, and the
//! listing operation that resolves every stored chat to its title.

pub mod listing;
pub mod models;
pub mod store;

pub use listing::{list_chats, ChatListing};
pub use models::{Chat, ChatMessage, MessageRole};
pub use store::{ChatStore, CHATS_NAMESPACE};
