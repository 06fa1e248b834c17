pub mod chart;
pub mod config;
pub mod export;
pub mod load;
pub mod process;
pub mod walkthrough;
