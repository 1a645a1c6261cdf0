use crate::codec::{ReadSaveExt, TrackedRead, WriteSaveExt};
use crate::object::{ObjectHeader, SaveObject, SaveObjectKind};
use crate::property::{read_property_list, write_property_list};
use crate::{SaveError, SaveErrorKind};
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::io::{self, Cursor, Read, Write};

const MAGIC: [i32; 3] = [5, 17, 66297];
const HEADER_CONSTANT: i32 = 1;

/// When an entity header is followed by this value, another entity follows.
const NEXT_IS_ENTITY: i32 = 1;

/// A decoded Satisfactory save file.
///
/// Decoding is strict: every known constant is checked and any violation is
/// a typed error rather than a guess, since the game engine is unforgiving
/// about layout. Several header fields have no known meaning and are carried
/// opaquely so that re-encoding reproduces them.
///
/// Re-encoding an unmodified save reproduces the header and catalog bytes
/// exactly; data-block lengths are recomputed from the property lists.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SatisfactorySave {
    /// Root object name, `Persistent_Level` in every observed save.
    pub root_object: String,
    /// URL-style session arguments (startloc, sessionName, Visibility).
    pub world_arguments: String,
    pub save_name: String,
    /// Opaque header field, round-tripped without interpretation.
    pub unknown_header_int1: i32,
    /// Opaque header field, round-tripped without interpretation.
    pub unknown_header_bytes: [u8; 9],
    /// All save objects, actors first and then components, in file order.
    pub objects: Vec<SaveObject>,
    /// Trailing table of string pairs with unknown purpose.
    pub unknown_map: Vec<(String, String)>,
}

fn check_magic(found: i32, expected: i32) -> Result<(), SaveError> {
    if found != expected {
        return Err(SaveErrorKind::InvalidMagic { expected, found }.into());
    }
    Ok(())
}

impl SatisfactorySave {
    /// Decodes a save from an in-memory buffer.
    pub fn from_slice(data: &[u8]) -> Result<Self, SaveError> {
        Self::from_reader(Cursor::new(data))
    }

    /// Decodes a save from a reader in a single forward pass.
    pub fn from_reader(mut r: impl Read) -> Result<Self, SaveError> {
        for expected in MAGIC {
            check_magic(r.read_i32::<LE>()?, expected)?;
        }

        let root_object = r.read_save_string()?;
        let world_arguments = r.read_save_string()?;
        let save_name = r.read_save_string()?;

        let unknown_header_int1 = r.read_i32::<LE>()?;
        let mut unknown_header_bytes = [0u8; 9];
        r.read_exact(&mut unknown_header_bytes)?;

        let entry_count = r.read_u32::<LE>()?;

        let constant = r.read_i32::<LE>()?;
        if constant != HEADER_CONSTANT {
            return Err(SaveErrorKind::InvalidHeader {
                expected: HEADER_CONSTANT,
                found: constant,
            }
            .into());
        }

        let mut objects = Vec::new();

        // Entity catalog: each header trails a flag saying whether another
        // entity record follows.
        loop {
            objects.push(SaveObject::new(ObjectHeader::read(&mut r)?));
            if r.read_i32::<LE>()? != NEXT_IS_ENTITY {
                break;
            }
        }

        // Component catalog: each header trails a running count that stays
        // zero until the final record, where it must equal the number of
        // catalog entries decoded so far.
        loop {
            objects.push(SaveObject::new(ObjectHeader::read(&mut r)?));
            let count = r.read_u32::<LE>()?;
            if count != 0 {
                if count as usize != objects.len() {
                    return Err(SaveErrorKind::CatalogCountMismatch {
                        declared: count,
                        actual: objects.len(),
                    }
                    .into());
                }
                break;
            }
        }

        if entry_count as usize != objects.len() {
            return Err(SaveErrorKind::EntryCountMismatch {
                declared: entry_count,
                actual: objects.len(),
            }
            .into());
        }

        // Data blocks, one per catalog entry in order. Bytes between the
        // property terminator and the end of a block are preserved verbatim.
        for (index, object) in objects.iter_mut().enumerate() {
            let declared = r.read_i32::<LE>()?;
            let Ok(declared_len) = u64::try_from(declared) else {
                return Err(SaveErrorKind::DataBlockLengthMismatch {
                    index,
                    declared,
                    actual: 0,
                }
                .into());
            };

            let mut block = TrackedRead::new(&mut r);
            object.properties = read_property_list(&mut block)?;

            let consumed = block.consumed();
            if consumed > declared_len {
                return Err(SaveErrorKind::DataBlockLengthMismatch {
                    index,
                    declared,
                    actual: consumed,
                }
                .into());
            }

            let mut trailing = vec![0u8; (declared_len - consumed) as usize];
            block.read_exact(&mut trailing)?;
            object.trailing = trailing;
        }

        let pair_count = r.read_u32::<LE>()?;
        let mut unknown_map = Vec::with_capacity(pair_count as usize);
        for _ in 0..pair_count {
            let first = r.read_save_string()?;
            let second = r.read_save_string()?;
            unknown_map.push((first, second));
        }

        Ok(SatisfactorySave {
            root_object,
            world_arguments,
            save_name,
            unknown_header_int1,
            unknown_header_bytes,
            objects,
            unknown_map,
        })
    }

    /// Encodes the save.
    ///
    /// Headers are written first (entities, then components, with the
    /// trailing flags and running count derived from the final object
    /// order), then each object's data block is serialized into a scratch
    /// buffer to measure it before its length prefix is written. The format
    /// puts the length before the payload, so a single streaming pass is
    /// not possible.
    pub fn write(&self, mut w: impl Write) -> Result<(), SaveError> {
        let entities: Vec<&SaveObject> = self
            .objects
            .iter()
            .filter(|o| o.header.kind() == SaveObjectKind::Actor)
            .collect();
        let components: Vec<&SaveObject> = self
            .objects
            .iter()
            .filter(|o| o.header.kind() == SaveObjectKind::Component)
            .collect();

        // The catalog cannot express an empty partition: termination is
        // signaled on a record, not before it.
        if entities.is_empty() || components.is_empty() {
            return Err(SaveErrorKind::CatalogCountMismatch {
                declared: 0,
                actual: self.objects.len(),
            }
            .into());
        }

        for magic in MAGIC {
            w.write_i32::<LE>(magic)?;
        }

        w.write_save_string(&self.root_object)?;
        w.write_save_string(&self.world_arguments)?;
        w.write_save_string(&self.save_name)?;

        w.write_i32::<LE>(self.unknown_header_int1)?;
        w.write_all(&self.unknown_header_bytes)?;
        w.write_u32::<LE>(self.objects.len() as u32)?;
        w.write_i32::<LE>(HEADER_CONSTANT)?;

        for (i, entity) in entities.iter().enumerate() {
            entity.header.write(&mut w)?;
            let has_next = i + 1 < entities.len();
            w.write_i32::<LE>(if has_next { NEXT_IS_ENTITY } else { 0 })?;
        }

        for (i, component) in components.iter().enumerate() {
            component.header.write(&mut w)?;
            let is_last = i + 1 == components.len();
            w.write_u32::<LE>(if is_last { self.objects.len() as u32 } else { 0 })?;
        }

        let mut scratch = Vec::new();
        for object in entities.iter().chain(components.iter()) {
            scratch.clear();
            write_property_list(&object.properties, &mut scratch)?;
            scratch.extend_from_slice(&object.trailing);

            let len = i32::try_from(scratch.len()).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidData, "data block exceeds 2 GiB")
            })?;
            w.write_i32::<LE>(len)?;
            w.write_all(&scratch)?;
        }

        w.write_u32::<LE>(self.unknown_map.len() as u32)?;
        for (first, second) in &self.unknown_map {
            w.write_save_string(first)?;
            w.write_save_string(second)?;
        }

        Ok(())
    }
}
