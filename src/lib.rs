pub mod access;
pub mod adapter;
pub mod config;
pub mod db;
pub mod model;
pub mod ops;
pub mod output;
pub mod paths;
pub mod watch;
