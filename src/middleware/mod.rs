pub mod auth;
pub mod callback_allowlist;
pub mod request_logger;
