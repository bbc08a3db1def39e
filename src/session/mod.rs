mod builder;
mod keyboard;
mod pipeline;
mod render;
mod runtime;


pub use builder::SessionBuilder;
pub use keyboard::{KeyMapper, KeyboardInputHandler};
pub use pipeline::Session;
pub use render::{title_case, TerminalRenderer};
pub use runtime::ShutdownReason;
