//! Tollgate core: domain models, error taxonomy, input validation and the
//! repository traits the authorization engine consumes.

pub mod error;
pub mod models;
pub mod repository;
pub mod validation;

pub use error::{TollgateError, TollgateResult};
