pub mod batch;
pub mod invoker;
pub mod pipeline;
pub mod prompts;
