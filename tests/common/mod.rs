//! Common test utilities and helpers
//!
//! Fakes for the Bitbucket REST seams and fixtures shared by the
//! integration tests.

#![allow(dead_code)]

pub mod mock_services;
pub mod test_fixtures;
