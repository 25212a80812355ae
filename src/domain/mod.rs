// Domain layer - Traffic counts, generator configuration and form validation
pub mod forms;
pub mod generator;
pub mod query;
pub mod traffic;
pub mod validation;
