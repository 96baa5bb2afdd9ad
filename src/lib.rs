pub mod api_defaults;
pub mod cli;
pub mod cmds;
pub mod config;
pub mod error;
pub mod freshness;
pub mod http;
pub mod io;
pub mod logging;
pub mod storage;
pub mod time;
pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;

#[macro_use]
extern crate log;

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate derive_builder;
