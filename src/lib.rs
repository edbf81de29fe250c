pub mod batch;
pub mod config;
pub mod error;
pub mod multiply;
pub mod process;
pub mod report;

pub use error::MultiplyError;
pub use multiply::{multiply, Batch, Multiplied, Plan, Row, Table};
