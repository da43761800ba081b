pub mod candidate;
pub mod task;
