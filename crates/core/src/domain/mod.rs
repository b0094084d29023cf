pub mod actor;
pub mod decision;
pub mod project;
pub mod submission;
