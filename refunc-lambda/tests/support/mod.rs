#![allow(dead_code)]

pub mod fake_api;
#[cfg(unix)]
pub mod scripts;
