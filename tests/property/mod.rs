//! Property-based tests

mod event_proptest;
