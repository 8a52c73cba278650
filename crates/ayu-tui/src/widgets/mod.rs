//! UI widgets

pub mod chips;
pub mod input_box;
pub mod message_list;
pub mod spinner;
pub mod status;

pub use chips::OptionChips;
pub use input_box::{InputBar, InputMode};
pub use message_list::{ChatBubble, MessageList};
pub use spinner::ThinkingIndicator;
pub use status::ActivityStrip;
