pub mod factordb_client;

pub use factordb_client::FactorDbClient;
