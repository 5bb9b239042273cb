pub mod job;

pub use job::{Graded, JobProfile};
