//! Integration tests for the addition engine against real directory trees.

mod relocation;
mod scenarios;
