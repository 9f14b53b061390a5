pub mod client;
pub mod gateway;
pub mod types;

pub use client::{PerformanceQuery, SpectrumClient};
pub use gateway::{ApiGateway, Session};
