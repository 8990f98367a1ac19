//! Unit tests for the database layer that run without a server

mod connection_tests;
