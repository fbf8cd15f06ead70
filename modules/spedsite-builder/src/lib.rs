pub mod bootstrap;
pub mod contacts;
pub mod enrichment;
pub mod loader;
pub mod orchestrator;
pub mod site;
pub mod stats;
pub mod templates;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
