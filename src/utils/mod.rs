pub mod error;
pub mod validation;

pub use validation::{allowed_file, annotated_name, storage_name, ALLOWED_EXTENSIONS};
