//! CLI command implementations.

pub mod cleanup;
pub mod finders;
pub mod report;
pub mod run;
pub mod schedule;
pub mod screeners;
pub mod validate;
