pub mod cli;
pub mod config;
pub mod gateway;
pub mod storage;
pub mod utils;
pub mod vault;

// Re-export specific items to avoid conflicts
pub use cli::{args, commands};
pub use gateway::{Gateway, LoginOutcome, Outcome};
pub use utils::errors::{ErrorKind, GatewayFailure, PvwaError};
pub use vault::client::{ProxyResult, QueryParams, QueryValue};
pub use vault::credentials::{AuthMechanism, Credentials, LoginRequest};
pub use vault::session::{Session, SessionHolder};
pub use vault::token::sanitize_token;
pub use vault::{auth, client, ensure_trailing_slash};
