//! End-to-end tests: contracts in, working objects out.

mod harness;

mod classes;
mod failures;
mod generator;
mod proxy;
