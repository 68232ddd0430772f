//! Integration tests against a running server
//!
//! Start the server and the database first, then run:
//! `cargo test --test integration -- --ignored`

mod api_tests;
