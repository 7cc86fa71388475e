pub mod batch;
pub mod composite;
pub mod factorization;

pub use batch::{BatchPlan, EngineOptions, PageRequest, WorkBatch};
pub use composite::Composite;
pub use factorization::{decode, encode, FactorizationResult};
