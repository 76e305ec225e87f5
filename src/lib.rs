pub mod config;
pub mod dispatch;
pub mod health;
pub mod logging;
pub mod machine;
pub mod render;
pub mod scoring;
pub mod session;
pub mod steps;
pub mod telegram;
