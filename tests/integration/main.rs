//! Integration tests for zvox.

mod helpers;

mod adapter_test;
mod cli_test;
mod narration_test;
