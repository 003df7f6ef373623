//! Utilities shared by the crate's tests

pub mod test_utils;
