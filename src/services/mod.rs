pub mod openai;
pub mod rate_limiter;
