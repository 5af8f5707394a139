pub mod advertisement;
pub mod filter;
pub mod settings;
pub mod stats;
pub mod transaction;
pub mod user;
