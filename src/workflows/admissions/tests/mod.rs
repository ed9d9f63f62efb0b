mod common;

mod completeness;
mod intake;
