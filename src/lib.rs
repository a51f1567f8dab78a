pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod gate;
pub mod notify;
pub mod run;
