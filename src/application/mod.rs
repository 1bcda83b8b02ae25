/// Application layer
///
/// - `services`: repository and mirror resolution
/// - `scm`: the SCM adapter handed to the orchestrator, and its builder
/// - `filesystem`: lightweight, ref-scoped browsing without a clone
pub mod filesystem;
pub mod scm;
pub mod services;
