use crate::codec::{ReadSaveExt, WriteSaveExt};
use crate::property::Property;
use crate::SaveError;
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::io::{Read, Write};

/// Identifies a save object by name instead of by pointer.
///
/// Many objects in a save point at other objects. The format stores these
/// links as a `(level name, path name)` pair; resolving them into live
/// objects is left to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct ObjectReference {
    pub level_name: String,
    pub path_name: String,
}

impl ObjectReference {
    pub fn new(level_name: impl Into<String>, path_name: impl Into<String>) -> Self {
        ObjectReference {
            level_name: level_name.into(),
            path_name: path_name.into(),
        }
    }

    pub(crate) fn read(r: &mut (impl Read + ?Sized)) -> Result<Self, SaveError> {
        let level_name = r.read_save_string()?;
        let path_name = r.read_save_string()?;
        Ok(ObjectReference {
            level_name,
            path_name,
        })
    }

    pub(crate) fn write(&self, w: &mut (impl Write + ?Sized)) -> Result<(), SaveError> {
        w.write_save_string(&self.level_name)?;
        w.write_save_string(&self.path_name)
    }
}

/// Discriminant stored at the front of every catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum SaveObjectKind {
    Component = 0,
    Actor = 1,
}

/// Spatial placement of an actor. Absent from the stream entirely when the
/// actor's `need_transform` flag is zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct ActorTransform {
    pub rotation: [f32; 4],
    pub position: [f32; 3],
    pub scale: [f32; 3],
}

/// Catalog entry for one save object.
///
/// Actors are spatial entities with an optional transform; components are
/// sub-objects attached to a parent actor by path name. Which shape follows
/// the common fields is fully determined by the leading kind flag.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum ObjectHeader {
    Actor {
        type_path: String,
        instance: ObjectReference,
        transform: Option<ActorTransform>,
        was_placed_in_level: bool,
    },
    Component {
        type_path: String,
        instance: ObjectReference,
        parent_entity_name: String,
    },
}

impl ObjectHeader {
    pub fn kind(&self) -> SaveObjectKind {
        match self {
            ObjectHeader::Actor { .. } => SaveObjectKind::Actor,
            ObjectHeader::Component { .. } => SaveObjectKind::Component,
        }
    }

    /// Game class identifier, e.g.
    /// `/Script/FactoryGame.FGInventoryComponentTrash`.
    pub fn type_path(&self) -> &str {
        match self {
            ObjectHeader::Actor { type_path, .. } => type_path,
            ObjectHeader::Component { type_path, .. } => type_path,
        }
    }

    pub fn instance(&self) -> &ObjectReference {
        match self {
            ObjectHeader::Actor { instance, .. } => instance,
            ObjectHeader::Component { instance, .. } => instance,
        }
    }

    /// Decodes exactly one catalog header. Headers are not length prefixed,
    /// so the caller relies on this consuming precisely the header's bytes.
    pub fn read(r: &mut (impl Read + ?Sized)) -> Result<Self, SaveError> {
        let kind = r.read_i32::<LE>()?;
        let type_path = r.read_save_string()?;
        let instance = ObjectReference::read(r)?;

        if kind == SaveObjectKind::Actor as i32 {
            let transform = if r.read_save_bool()? {
                Some(ActorTransform {
                    rotation: r.read_f32_array()?,
                    position: r.read_f32_array()?,
                    scale: r.read_f32_array()?,
                })
            } else {
                None
            };
            let was_placed_in_level = r.read_save_bool()?;

            Ok(ObjectHeader::Actor {
                type_path,
                instance,
                transform,
                was_placed_in_level,
            })
        } else {
            let parent_entity_name = r.read_save_string()?;

            Ok(ObjectHeader::Component {
                type_path,
                instance,
                parent_entity_name,
            })
        }
    }

    pub fn write(&self, w: &mut (impl Write + ?Sized)) -> Result<(), SaveError> {
        w.write_i32::<LE>(self.kind() as i32)?;
        w.write_save_string(self.type_path())?;
        self.instance().write(w)?;

        match self {
            ObjectHeader::Actor {
                transform,
                was_placed_in_level,
                ..
            } => {
                w.write_save_bool(transform.is_some())?;
                if let Some(t) = transform {
                    w.write_f32_array(&t.rotation)?;
                    w.write_f32_array(&t.position)?;
                    w.write_f32_array(&t.scale)?;
                }
                w.write_save_bool(*was_placed_in_level)?;
            }
            ObjectHeader::Component {
                parent_entity_name, ..
            } => {
                w.write_save_string(parent_entity_name)?;
            }
        }

        Ok(())
    }
}

/// A fully decoded save object: its catalog header, the property list from
/// its data block, and any bytes that trailed the property terminator inside
/// the block (preserved verbatim for round-tripping).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SaveObject {
    pub header: ObjectHeader,
    pub properties: Vec<Property>,
    pub trailing: Vec<u8>,
}

impl SaveObject {
    pub fn new(header: ObjectHeader) -> Self {
        SaveObject {
            header,
            properties: Vec::new(),
            trailing: Vec::new(),
        }
    }
}
