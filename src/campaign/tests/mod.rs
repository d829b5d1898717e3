//! Unit tests for the campaign module.
//!
//! Domain rules are tested directly; the pipeline stages and the
//! orchestrator run against the in-memory social API and store.

mod pipeline_tests;
