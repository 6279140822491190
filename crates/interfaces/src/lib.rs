pub mod error;
pub mod terminal;
pub mod traits;
pub mod ui;

pub use error::ActionError;
pub use terminal::TerminalInterface;
pub use traits::{Interface, UiDispatcher, UiJob};
pub use ui::{InlineUi, UiThread};
