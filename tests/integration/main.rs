//! Integration tests

mod e2e_test;
mod properties_test;
