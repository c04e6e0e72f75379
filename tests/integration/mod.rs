//! Integration tests against the full router

mod api;
