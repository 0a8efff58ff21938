//! Integration tests - Tests that drive several components through a mocked executor
//!
//! These tests verify that query compilation, eager loading and result
//! iteration work together, counting every statement sent to the executor.

mod eager_load_tests;
mod result_iterator_tests;
