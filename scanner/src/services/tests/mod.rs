//! Tests for scanner services
//!
//! These exercise the real collaborator implementations against a
//! temporary directory and a mock HTTP server.
