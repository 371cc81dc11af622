pub mod backend;
pub mod chat;
pub mod cli;
pub mod session;
pub mod verify;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
