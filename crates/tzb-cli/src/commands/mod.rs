pub mod build;
pub mod diff;
pub mod lint;
pub mod names;
pub mod queries;
pub mod validate;
