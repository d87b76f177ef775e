//! Property-based tests for the patch engine
