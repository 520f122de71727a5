pub mod build;
pub mod describe;
pub mod fetch;
pub mod upgrade;
