//! End-to-end coverage for the Safe deployment workspace.
//!
//! The crate itself is empty; the scenarios live under `tests/` and exercise
//! the public surface of `safedeploy` against the simulated ledger from
//! `eth_test_utils`.
