pub mod rate_limit;

pub use rate_limit::with_rate_limit;
