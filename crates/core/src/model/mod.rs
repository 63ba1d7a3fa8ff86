pub mod analysis;
pub mod trace;
