pub mod charts;
pub mod chrome;
pub mod map;
pub mod popup;
pub mod tables;
