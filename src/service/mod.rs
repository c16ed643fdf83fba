//! CrudService: generic CRUD using safe SQL builder.

mod crud;
mod form;
mod validation;
pub use crud::CrudService;
pub use form::{coerce_form_value, coerce_token, form_values, is_submitted, SUBMITTED_MARKER, TIMESTAMP_FORMAT};
pub use validation::RequestValidator;
