mod common;
mod contention;
mod pool;
mod validation;
