//! Command implementations for the hedge-trade binary, exposed as a library
//! so the workflow can be driven against a mock exchange in tests.

pub mod commands;
