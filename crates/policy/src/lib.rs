pub mod gate;
pub mod navigation;
pub mod session;
pub mod window;

pub use gate::{DenyReason, GateDecision, Protected, SecurityGate};
pub use navigation::{NavigationEdge, NavigationError, NavigationTable};
pub use session::{SessionHandle, SessionSnapshot};
pub use window::WindowKind;
