pub mod column;
pub mod database;
pub mod metric;
pub mod permission;
pub mod table;
