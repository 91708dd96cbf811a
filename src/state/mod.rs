pub mod error;
pub mod event;
pub mod machine;
pub mod model;

pub use error::{StateError, StateResult};
pub use event::{ModeEvent, ModeTransition};
pub use machine::ModeMachine;
pub use model::EditMode;
