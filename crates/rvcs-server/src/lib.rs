pub mod error;
pub mod router;
pub mod rpc;
pub mod server;
pub mod session;

pub use error::ServerError;
pub use router::Router;
pub use server::{start, ServerConfig, ServerHandle};
pub use session::{Session, SessionContext};
