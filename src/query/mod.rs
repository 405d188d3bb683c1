pub mod ast;
pub mod parser;
pub mod types;
pub mod builder;
pub mod result_filter;
