mod conf;
pub use conf::*;
mod cluster;
pub use cluster::*;
mod client;
pub use client::*;
