pub mod client;
pub mod endpoints;
pub mod session;
pub mod token_store;
pub mod totp;
pub mod transport;

pub use client::KiteClient;
pub use session::SessionManager;
pub use token_store::TokenStore;
pub use transport::{HttpTransport, Payload, RawResponse, Transport};
