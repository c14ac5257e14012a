// Price cache, fallback learning and the price source adapter
pub mod market_data;

// Alert decision engine
pub mod alerts;

// Session state, scheduling and the monitoring loop
pub mod monitoring;

// Wiring of concrete infrastructure
pub mod system;
