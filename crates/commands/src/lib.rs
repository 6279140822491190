pub mod definition;
pub mod registry;
pub mod table;
pub mod traits;

pub use definition::{normalize, CommandDefinition, CommandKind, CommandScope};
pub use registry::{CommandRegistry, CommandRegistryBuilder, RegistryError};
pub use table::{ActionBinder, CommandSpec, CommandTable};
pub use traits::CommandAction;
