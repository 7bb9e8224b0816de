//! Integration tests for Bulletin-Harvest
//!
//! These tests use wiremock to stand in for the bulletin site and tempfile
//! for download directories and databases.

mod common;
mod crawl_tests;
mod fetch_tests;
