//! In-memory library implementation.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use blockpick_core::{
    ActionSpec, LibraryError, LibraryKind, LibraryLookup, LibraryRef, LocationSpec, MotionPattern,
    ObjectSpec, Pose,
};

/// In-memory library of objects, actions, and locations.
///
/// Resolution prefers the record id; a reference without an id falls back to
/// exact name matching.
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    objects: Vec<ObjectSpec>,
    actions: Vec<ActionSpec>,
    locations: Vec<LocationSpec>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, object: ObjectSpec) -> Self {
        self.objects.push(object);
        self
    }

    pub fn with_action(mut self, action: ActionSpec) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_location(mut self, location: LocationSpec) -> Self {
        self.locations.push(location);
        self
    }

    /// Load a fixture file. Shape images are read from paths relative to
    /// the fixture's directory.
    pub fn from_file(path: &Path) -> Result<Self, LibraryError> {
        let content =
            std::fs::read_to_string(path).map_err(|err| LibraryError::Io(err.to_string()))?;
        let file: LibraryFile =
            serde_json::from_str(&content).map_err(|err| LibraryError::Io(err.to_string()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut library = Self::new();
        for record in file.objects {
            let shape_png = std::fs::read(base.join(&record.shape_path))
                .map_err(|err| LibraryError::Io(format!("{}: {}", record.shape_path, err)))?;
            library.objects.push(ObjectSpec {
                reference: LibraryRef::resolved(record.id, record.name),
                shape_png,
                height_mm: record.height_mm,
                grip_force: record.grip_force,
            });
        }
        for record in file.actions {
            library.actions.push(ActionSpec {
                reference: LibraryRef::resolved(record.id, record.name),
                pattern: record.pattern,
                points: record.points,
            });
        }
        for record in file.locations {
            library.locations.push(LocationSpec {
                reference: LibraryRef::resolved(record.id, record.name),
                pose: record.pose,
            });
        }
        Ok(library)
    }

    fn find<'a, T>(
        records: &'a [T],
        reference: &LibraryRef,
        kind: LibraryKind,
        record_ref: impl Fn(&T) -> &LibraryRef,
    ) -> Result<&'a T, LibraryError> {
        let hit = match reference.id {
            Some(id) => records.iter().find(|r| record_ref(r).id == Some(id)),
            None => records.iter().find(|r| record_ref(r).name == reference.name),
        };
        hit.ok_or_else(|| LibraryError::NotFound {
            kind,
            name: reference.name.clone(),
        })
    }
}

#[async_trait]
impl LibraryLookup for InMemoryLibrary {
    async fn object(&self, reference: &LibraryRef) -> Result<ObjectSpec, LibraryError> {
        Self::find(&self.objects, reference, LibraryKind::Object, |o| {
            &o.reference
        })
        .cloned()
    }

    async fn action(&self, reference: &LibraryRef) -> Result<ActionSpec, LibraryError> {
        Self::find(&self.actions, reference, LibraryKind::Action, |a| {
            &a.reference
        })
        .cloned()
    }

    async fn location(&self, reference: &LibraryRef) -> Result<LocationSpec, LibraryError> {
        Self::find(&self.locations, reference, LibraryKind::Location, |l| {
            &l.reference
        })
        .cloned()
    }
}

/// Serde model of a library fixture file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LibraryFile {
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
    #[serde(default)]
    pub locations: Vec<LocationRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: i64,
    pub name: String,
    /// PNG silhouette path, relative to the fixture file.
    pub shape_path: String,
    pub height_mm: f64,
    pub grip_force: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: i64,
    pub name: String,
    pub pattern: MotionPattern,
    #[serde(default)]
    pub points: Vec<Pose>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: i64,
    pub name: String,
    pub pose: Pose,
}
