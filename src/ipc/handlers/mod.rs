pub mod core;
pub mod dashboard;
pub mod form;
pub mod students;
pub mod view;
