pub mod result;
pub mod schema;
