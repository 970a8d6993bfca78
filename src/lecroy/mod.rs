pub mod client;
pub mod codec;
pub mod mock;
pub mod session;
pub mod transport;
pub mod vicp;

// Re-export the main types from client
pub use client::{LecroyScope, LecroyScopeBuilder};
pub use codec::{Codec, CommandLine};
pub use mock::MockTransport;
pub use session::{Session, TimeoutGuard};
pub use transport::Transport;
pub use vicp::{ConnectionConfig, VicpTransport};
