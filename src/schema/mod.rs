pub mod settings;
pub mod schema;
