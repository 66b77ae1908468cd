//! Small helpers used around binding code.

pub mod debounce;
pub mod random;

pub use debounce::Debouncer;
pub use random::random_hex;
