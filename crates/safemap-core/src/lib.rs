pub mod assessment;
pub mod precision;
pub mod records;
pub mod report;
pub mod route;
pub mod scoring;
pub mod spatial;
pub mod store;
pub mod temporal;
pub mod types;

#[cfg(test)]
mod testing;

pub use assessment::*;
pub use precision::*;
pub use records::*;
pub use report::*;
pub use route::*;
pub use scoring::*;
pub use spatial::*;
pub use store::*;
pub use temporal::*;
pub use types::*;
