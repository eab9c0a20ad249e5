//! Library record types: objects, processing actions, and place locations.
//!
//! Records are authored and persisted by the management collaborator; the
//! execution core only ever reads them through [`crate::library::LibraryLookup`].

use serde::{Deserialize, Serialize};

use super::Pose;

/// Reference to a library record, as embedded in a program tree.
///
/// `id == None` marks a reference the library could not resolve. Such a
/// reference is fatal for execution: validation reports the program as
/// malformed before any hardware is touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRef {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl LibraryRef {
    /// Reference resolved to a concrete record id.
    pub fn resolved(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            keywords: Vec::new(),
        }
    }

    /// Reference that failed name/keyword resolution.
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            keywords: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.id.is_some()
    }
}

/// A pickable object: reference silhouette plus grasp parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub reference: LibraryRef,
    /// PNG-encoded binary silhouette of the object seen from above.
    pub shape_png: Vec<u8>,
    /// Grasp height above the table, millimetres.
    pub height_mm: f64,
    /// Object-specific grip force unit; the search procedure scales it
    /// before commanding the hand.
    pub grip_force: f64,
}

/// Motion pattern of a processing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPattern {
    Linear,
    Circular,
    Cross,
    /// Pattern recorded point-by-point by the user.
    Custom,
}

/// Fixed playback points for the predefined patterns.
///
/// The predefined patterns carry controller-side placeholder points; only a
/// `Custom` action plays user-recorded poses.
const PREDEFINED_PATTERN_POINTS: [Pose; 2] = [
    Pose {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        rx: 0.0,
        ry: 0.0,
        rz: 0.0,
        fig: 0.0,
    },
    Pose {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        rx: 0.0,
        ry: 0.0,
        rz: 0.0,
        fig: 0.0,
    },
];

/// A processing action: a motion pattern played between pick and place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSpec {
    pub reference: LibraryRef,
    pub pattern: MotionPattern,
    /// Recorded 6-DoF poses; meaningful for `Custom` only.
    #[serde(default)]
    pub points: Vec<Pose>,
}

impl ActionSpec {
    /// The pose sequence the interpreter plays for this action.
    pub fn playback_points(&self) -> &[Pose] {
        match self.pattern {
            MotionPattern::Custom => &self.points,
            _ => &PREDEFINED_PATTERN_POINTS,
        }
    }
}

/// A place location: one taught pose with its configuration code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSpec {
    pub reference: LibraryRef,
    pub pose: Pose,
}
