//! Command-line interface of the `pvars` binary

mod args;

pub use args::{Args, SubCommand};
