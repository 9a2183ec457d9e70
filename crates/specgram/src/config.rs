//! Configuration types for the specgram engine.
//!
//! This module provides configuration structures that control diagram size
//! limits, where new managed regions are inserted, and the optional external
//! validator. All types implement [`serde::Deserialize`] for loading from a
//! TOML file; every field falls back to a built-in default.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining all sections.
//! - [`JourneyConfig`] - Node limits for the journey flowchart.
//! - [`RelationshipConfig`] - Entity limits for the entity-relationship diagram.
//! - [`AnchorsConfig`] - Insertion anchors for regions that do not exist yet.
//! - [`ValidationConfig`] - External strict-mode validator command.
//!
//! # Example
//!
//! ```
//! # use specgram::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.journey().soft_node_limit(), 20);
//! assert!(config.check().is_ok());
//! ```

use std::time::Duration;

use serde::Deserialize;

use specgram_core::diagram::DiagramKind;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Journey diagram section.
    #[serde(default)]
    journey: JourneyConfig,

    /// Entity-relationship diagram section.
    #[serde(default)]
    relationship: RelationshipConfig,

    /// Insertion anchors per diagram kind.
    #[serde(default)]
    anchors: AnchorsConfig,

    /// External validator section.
    #[serde(default)]
    validation: ValidationConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        journey: JourneyConfig,
        relationship: RelationshipConfig,
        anchors: AnchorsConfig,
        validation: ValidationConfig,
    ) -> Self {
        Self {
            journey,
            relationship,
            anchors,
            validation,
        }
    }

    /// Replace the validation section.
    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    /// Replace the journey section.
    pub fn with_journey(mut self, journey: JourneyConfig) -> Self {
        self.journey = journey;
        self
    }

    pub fn journey(&self) -> &JourneyConfig {
        &self.journey
    }

    pub fn relationship(&self) -> &RelationshipConfig {
        &self.relationship
    }

    pub fn anchors(&self) -> &AnchorsConfig {
        &self.anchors
    }

    pub fn validation(&self) -> &ValidationConfig {
        &self.validation
    }

    /// Check the values that deserialization cannot.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value: a zero or inverted
    /// limit, an empty anchor heading, or a zero timeout.
    pub fn check(&self) -> Result<(), String> {
        check_limits(
            "journey",
            self.journey.soft_node_limit,
            self.journey.hard_node_limit,
        )?;
        check_limits(
            "relationship",
            self.relationship.soft_entity_limit,
            self.relationship.hard_entity_limit,
        )?;
        for kind in DiagramKind::ALL {
            if self.anchors.for_kind(kind).heading.trim().is_empty() {
                return Err(format!("anchors.{}: heading must not be empty", anchor_key(kind)));
            }
        }
        if self.validation.timeout_ms == 0 {
            return Err("validation.timeout_ms must be greater than zero".to_string());
        }
        Ok(())
    }
}

fn check_limits(section: &str, soft: usize, hard: usize) -> Result<(), String> {
    if soft == 0 || hard == 0 {
        return Err(format!("{section}: limits must be greater than zero"));
    }
    if soft > hard {
        return Err(format!(
            "{section}: soft limit ({soft}) exceeds hard limit ({hard})"
        ));
    }
    Ok(())
}

fn anchor_key(kind: DiagramKind) -> &'static str {
    match kind {
        DiagramKind::Journey => "journey",
        DiagramKind::EntityRelationship => "entity_relationship",
    }
}

/// Size limits for the journey flowchart.
///
/// Above the soft limit the flowchart is restructured so groupings stack
/// side by side; above the hard limit a split warning is attached.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JourneyConfig {
    soft_node_limit: usize,
    hard_node_limit: usize,
}

impl JourneyConfig {
    pub fn new(soft_node_limit: usize, hard_node_limit: usize) -> Self {
        Self {
            soft_node_limit,
            hard_node_limit,
        }
    }

    pub fn soft_node_limit(&self) -> usize {
        self.soft_node_limit
    }

    pub fn hard_node_limit(&self) -> usize {
        self.hard_node_limit
    }
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self::new(20, 30)
    }
}

/// Size limits for the entity-relationship diagram.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelationshipConfig {
    soft_entity_limit: usize,
    hard_entity_limit: usize,
}

impl RelationshipConfig {
    pub fn new(soft_entity_limit: usize, hard_entity_limit: usize) -> Self {
        Self {
            soft_entity_limit,
            hard_entity_limit,
        }
    }

    pub fn soft_entity_limit(&self) -> usize {
        self.soft_entity_limit
    }

    pub fn hard_entity_limit(&self) -> usize {
        self.hard_entity_limit
    }
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self::new(10, 15)
    }
}

/// Where a new region goes relative to its anchor heading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Before the next heading of equal or higher level.
    #[default]
    EndOfSection,

    /// Directly below the heading line.
    AfterHeading,
}

/// Anchor for inserting a region that does not exist yet.
#[derive(Debug, Clone, Deserialize)]
pub struct AnchorConfig {
    /// Case-insensitive text the anchor heading must contain.
    heading: String,

    #[serde(default)]
    placement: Placement,
}

impl AnchorConfig {
    pub fn new(heading: impl Into<String>, placement: Placement) -> Self {
        Self {
            heading: heading.into(),
            placement,
        }
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }
}

/// Insertion anchors for each diagram kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnchorsConfig {
    journey: AnchorConfig,
    entity_relationship: AnchorConfig,
}

impl AnchorsConfig {
    pub fn new(journey: AnchorConfig, entity_relationship: AnchorConfig) -> Self {
        Self {
            journey,
            entity_relationship,
        }
    }

    /// Returns the anchor for `kind`.
    pub fn for_kind(&self, kind: DiagramKind) -> &AnchorConfig {
        match kind {
            DiagramKind::Journey => &self.journey,
            DiagramKind::EntityRelationship => &self.entity_relationship,
        }
    }
}

impl Default for AnchorsConfig {
    fn default() -> Self {
        Self::new(
            AnchorConfig::new("User Scenarios", Placement::EndOfSection),
            AnchorConfig::new("Key Entities", Placement::EndOfSection),
        )
    }
}

/// External validator used in strict mode.
///
/// `{input}` and `{output}` in `args` are replaced with temporary file
/// paths. Without `{input}` the markup is written to the command's stdin.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    command: Option<String>,
    args: Vec<String>,
    timeout_ms: u64,
}

impl ValidationConfig {
    pub fn new(command: Option<String>, args: Vec<String>, timeout_ms: u64) -> Self {
        Self {
            command,
            args,
            timeout_ms,
        }
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::new(None, Vec::new(), 5000)
    }
}
