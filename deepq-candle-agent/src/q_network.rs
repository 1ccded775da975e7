//! Action-value network.
mod base;
mod config;
pub use base::QNetwork;
pub use config::QNetworkConfig;
