pub mod app;
pub mod bootstrap;
pub mod commands;
pub mod context;
pub mod env;
pub mod io;
pub mod labels;
pub mod push;
pub mod runtime;
pub mod sync;
