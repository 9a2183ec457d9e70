//! Specgram Core Types and Definitions
//!
//! This crate provides the foundational types shared by the specgram
//! extraction, synthesis, and rewrite stages. It includes:
//!
//! - **Regions**: Marker-delimited spans of a document ([`region::ManagedRegion`])
//! - **Stories**: User stories and their acceptance scenarios ([`story`] module)
//! - **Entities**: Key entities, attributes, and relationships ([`entity`] module)
//! - **Diagrams**: Generated markup and validation verdicts ([`diagram`] module)
//!
//! Every value in this crate is rebuilt from the document text on each run;
//! nothing here is persisted.

pub mod diagram;
pub mod entity;
pub mod region;
pub mod story;
