//! `parcelink-matcher` — cascading contact-to-parcel matching engine.
//!
//! Pure engine crate: resolves contact fragments against read-only county
//! reference partitions. CSV loading helpers live in [`loader`]; no CLI
//! dependencies.

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod loader;
pub mod model;
pub mod name;
pub mod partition;
pub mod phone;
pub mod score;
pub mod strategy;

pub use config::{LinkConfig, MatchingConfig};
pub use engine::Matcher;
pub use error::LinkError;
pub use evidence::compute_summary;
pub use model::{
    ContactFragment, DemographicRecord, DemographicRef, MatchMethod, MatchRequest, MatchResponse,
    MatchResult, MatchSummary, PropertyRecord, PropertyRef,
};
pub use partition::{CountyPartition, InMemoryReference, ReferenceAccessor};
pub use strategy::StrategyKind;
