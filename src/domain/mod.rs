// Alert kinds, cooldown state and rolling history
pub mod alerts;

// Time source abstraction
pub mod clock;

// Domain-specific error types
pub mod errors;

// Pairs, prices and feed modes
pub mod market;

// Port interfaces
pub mod ports;

// Repository traits
pub mod repositories;
