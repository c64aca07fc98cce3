#![forbid(unsafe_code)]

pub mod bus;
pub mod config;
pub mod datamodel;
pub mod lifecycle;
pub mod spec;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
