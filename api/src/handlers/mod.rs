pub mod error;

pub use error::{handle_domain_error, into_actix_error, json_error_handler};
