//! Reference collaborator implementations for the Stormflow engine core.
//!
//! Everything here is a deliberately simple, in-memory stand-in: a project
//! that already holds its configuration, runoff and routing engines that
//! advance on fixed steps, and result/accounting sinks that record what the
//! orchestrator hands them. They exercise the full lifecycle without any
//! physics, which makes them useful as integration-test collaborators and
//! as starting points for embedding real sub-models.

pub mod climate;
pub mod hot_start;
pub mod mass_balance;
pub mod project;
pub mod rainfall;
pub mod results;
pub mod routing;
pub mod runoff;
pub mod statistics;
pub mod suite;
