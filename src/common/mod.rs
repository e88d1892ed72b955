pub mod error;
pub use error::PlanError;

pub mod result;
pub use result::PlanResult;
