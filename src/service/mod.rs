//! Validation and the user service between handlers and the repository.

mod user;
mod validation;
pub use user::UserService;
pub use validation::{ErrorMessage, ValidationRule, Validator};
