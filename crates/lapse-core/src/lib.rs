pub mod brightness;
pub mod color;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod frame;
pub mod io;
pub mod process;
pub mod project;
pub mod session;
