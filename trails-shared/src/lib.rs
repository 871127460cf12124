pub mod fare;
pub mod pii;

pub use fare::Fare;
pub use pii::{redact_email, Masked};
