//! Model provider HTTP plumbing.

pub mod http;
