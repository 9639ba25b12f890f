//! Traversal Comprehensive Test Suite
//!
//! End-to-end behavior of the graph layer against a canned archive.
//!
//! ## Test Tier Structure
//!
//! - **Tier 1: Core Invariants**
//!   Identifier grammar, branch tie-break, pagination merge.
//!
//! - **Tier 2: Behavioral Scenarios**
//!   Full traversals, retry/migration, commit fallback, visits.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test traversal_comprehensive
//! ```

// Test utilities
mod test_utils;

// Tier 1: Core Invariants
mod branch_selection_tests;
mod grammar_property_tests;
mod pagination_tests;

// Tier 2: Behavioral Scenarios
mod commit_fallback_tests;
mod end_to_end_tests;
mod retry_migration_tests;
mod visit_tests;
