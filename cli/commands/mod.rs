pub mod metrics;
pub mod pack;
pub mod scan;
