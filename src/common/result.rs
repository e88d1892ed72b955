use super::error::PlanError;

pub type PlanResult<T> = std::result::Result<T, PlanError>;
