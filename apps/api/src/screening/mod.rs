pub mod handlers;
pub mod pipeline;
pub mod ranking;
pub mod scoring;

#[cfg(test)]
pub mod testing;
