pub mod agent;
pub mod cancel;
pub mod graph;
pub mod scheduler;
