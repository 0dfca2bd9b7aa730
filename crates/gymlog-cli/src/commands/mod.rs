pub mod config;
pub mod gym;
pub mod stats;
pub mod track;
