// Reconstruction pipeline: stage handlers and the driver that sequences them

pub mod error;
pub mod orchestrator;
pub mod stages;
