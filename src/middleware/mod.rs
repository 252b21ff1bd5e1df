//! Request and payload validation

pub mod validator;

pub use validator::{InputValidator, ValidationError};
