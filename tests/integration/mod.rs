//! Integration tests for the eval meta-analysis pipeline.
//!
//! These tests drive the public API with a scripted generation backend
//! that replays canned response texts and records every request.

mod end_to_end;
mod error_recovery;
mod repair_loop;
mod support;
