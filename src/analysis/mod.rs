// src/analysis/mod.rs
//
// Per-angle shot analysis.
//
// Signal flow:
//   ShotTracker ──FinalizedSequence──▶ boundary_crossing ──GeometricFeatures──┐
//                                                                             ▼
//                          shot_record ◀──Classification── outcome_classifier
//
// Orchestrated by pipeline::ShotSession.

pub mod boundary_crossing;
pub mod outcome_classifier;
pub mod shot_record;

pub use boundary_crossing::{BoundaryCrossingAnalyzer, CrossingConfig, GeometricFeatures};
pub use outcome_classifier::{Classification, ClassifierConfig, OutcomeClassifier, RuleName};
pub use shot_record::{ShotRecord, ShotRecordBuilder, ShotReport, ShotStats, TrajectorySample};
