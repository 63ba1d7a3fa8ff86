pub mod db;
pub mod history;
pub mod schema;
pub mod write;

pub use db::Store;
