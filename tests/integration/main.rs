//! Integration tests

mod common;
mod config_test;
mod resolver_test;
mod store_test;
