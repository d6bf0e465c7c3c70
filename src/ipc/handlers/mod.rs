pub mod auth;
pub mod consolidated;
pub mod core;
pub mod marks;
pub mod stats;
pub mod students;
pub mod teachers;
pub mod unlock;
