pub mod args;
pub mod ids;
pub mod kind;
pub mod verb;

pub use args::FileArgs;
pub use ids::SessionId;
pub use kind::{UnknownKind, VcsKind};
pub use verb::Verb;
