pub mod constants;
pub mod geo;
pub mod query;
