pub mod bridge;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod desktop;
pub mod error;
pub mod events;
pub mod process;

#[cfg(test)]
pub mod test_utils;
