pub mod client;
pub mod config;
pub mod errors;
pub mod latch;
pub mod payload;
pub mod pool;
pub mod runner;
pub mod telemetry;
pub mod worker;
