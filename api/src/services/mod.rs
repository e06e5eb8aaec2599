pub mod buda;

pub use buda::BudaClient;
