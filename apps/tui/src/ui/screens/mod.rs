pub mod detail;
pub mod help;
pub mod map;
pub mod stats;
