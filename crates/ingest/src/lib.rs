pub mod aggregate;
pub mod jaeger;
pub mod scheduler;
pub mod worker;
