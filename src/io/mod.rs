// External I/O operations module
pub mod lock; // Single-instance lock file
pub mod signals; // Unix signal handling
