pub mod conf;
pub mod crud;
pub mod error;
pub mod model;
pub mod resolve;
pub mod schema;
pub mod views;
pub mod workflow;
