pub mod manager;

pub use manager::CountdownManager;
