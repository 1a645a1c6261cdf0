//! The tagged property encoding used inside every object's data block.
//!
//! Each property frames itself as `{name, type name, payload length, index,
//! metadata, payload}`. The payload length counts only the payload bytes;
//! per-kind metadata (the reserved zero byte, enum/struct type strings and
//! the like) sits between the frame and the payload and is not counted.
//! Decoding dispatches on the persisted type-name string through a registry,
//! so a new kind is supported by registering an entry rather than editing a
//! central match.

use crate::codec::{ReadSaveExt, TrackedRead, WriteSaveExt};
use crate::object::ObjectReference;
use crate::{SaveError, SaveErrorKind};
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::LazyLock;

/// Property name that terminates a property list. Stored in the stream, so
/// the exact value matters.
pub const PROPERTY_TERMINATOR: &str = "None";

/// One decoded property: its name, the frame's index field (round-tripped
/// opaquely; zero in every observed capture), and the typed value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Property {
    pub name: String,
    pub index: i32,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Property {
            name: name.into(),
            index: 0,
            value,
        }
    }
}

/// Value payload of a property, keyed on the wire by its type-name string.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum PropertyValue {
    Int(i32),
    Int64(i64),
    Float(f32),
    Bool(bool),
    Str(String),
    Name(String),
    Enum {
        enum_type: String,
        value: String,
    },
    Byte {
        enum_type: String,
        value: ByteValue,
    },
    Object(ObjectReference),
    Struct {
        struct_type: String,
        reserved: [u32; 4],
        value: StructValue,
    },
    Array {
        element_type: String,
        value: ArrayValue,
    },
    Map {
        key_type: String,
        value_type: String,
        reserved: u32,
        entries: Vec<(MapKey, Vec<Property>)>,
    },
}

/// A byte property carries a raw byte, or an enum constant name when its
/// enum type is anything other than `None`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum ByteValue {
    Raw(u8),
    Named(String),
}

/// Struct payloads: a few well-known fixed layouts, with a generic
/// sentinel-terminated property list for everything else.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum StructValue {
    Vector([f32; 3]),
    Rotator([f32; 3]),
    Quat([f32; 4]),
    LinearColor([f32; 4]),
    Properties(Vec<Property>),
}

/// Array payloads, homogeneous per the declared element type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum ArrayValue {
    Int(Vec<i32>),
    Int64(Vec<i64>),
    Float(Vec<f32>),
    Byte(Vec<u8>),
    Str(Vec<String>),
    Enum(Vec<String>),
    Object(Vec<ObjectReference>),
    Struct(StructArray),
}

/// Struct arrays share a single inner frame followed by one property list
/// per element. The inner declared size spans all elements and is recomputed
/// on write.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct StructArray {
    pub name: String,
    pub index: i32,
    pub struct_type: String,
    pub reserved: [u32; 4],
    pub elements: Vec<Vec<Property>>,
}

/// Map keys observed in captures. Values are property lists.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum MapKey {
    Int(i32),
    Str(String),
    Object(ObjectReference),
}

impl PropertyValue {
    /// The type-name string persisted in the stream for this variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Int(_) => "IntProperty",
            PropertyValue::Int64(_) => "Int64Property",
            PropertyValue::Float(_) => "FloatProperty",
            PropertyValue::Bool(_) => "BoolProperty",
            PropertyValue::Str(_) => "StrProperty",
            PropertyValue::Name(_) => "NameProperty",
            PropertyValue::Enum { .. } => "EnumProperty",
            PropertyValue::Byte { .. } => "ByteProperty",
            PropertyValue::Object(_) => "ObjectProperty",
            PropertyValue::Struct { .. } => "StructProperty",
            PropertyValue::Array { .. } => "ArrayProperty",
            PropertyValue::Map { .. } => "MapProperty",
        }
    }
}

type ReadFn = fn(&mut dyn Read) -> Result<(PropertyValue, u64), SaveError>;
type WriteFn = fn(&Property, &mut dyn Write) -> Result<(), SaveError>;

/// Decoder/encoder pair for one wire type name.
struct PropertyCodec {
    read: ReadFn,
    write: WriteFn,
}

static PROPERTY_CODECS: LazyLock<HashMap<&'static str, PropertyCodec>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    let mut register = |name, read, write| {
        m.insert(name, PropertyCodec { read, write });
    };

    register("IntProperty", read_int as ReadFn, write_int as WriteFn);
    register("Int64Property", read_int64, write_int64);
    register("FloatProperty", read_float, write_float);
    register("BoolProperty", read_bool, write_bool);
    register("StrProperty", read_str, write_str);
    register("NameProperty", read_name, write_name);
    register("EnumProperty", read_enum, write_enum);
    register("ByteProperty", read_byte, write_byte);
    register("ObjectProperty", read_object, write_object);
    register("StructProperty", read_struct, write_struct);
    register("ArrayProperty", read_array, write_array);
    register("MapProperty", read_map, write_map);
    m
});

fn unknown_type(name: &str) -> SaveError {
    SaveError::from(SaveErrorKind::UnknownPropertyType {
        name: name.to_string(),
    })
}

/// Decodes the next property of a list, or `None` when the terminator
/// sentinel is reached.
pub(crate) fn read_property(r: &mut dyn Read) -> Result<Option<Property>, SaveError> {
    let name = r.read_save_string()?;
    if name == PROPERTY_TERMINATOR {
        return Ok(None);
    }

    let type_name = r.read_save_string()?;
    let declared = r.read_u32::<LE>()?;
    let index = r.read_i32::<LE>()?;

    let codec = PROPERTY_CODECS
        .get(type_name.as_str())
        .ok_or_else(|| unknown_type(&type_name))?;
    let (value, consumed) = (codec.read)(r)?;

    if consumed != u64::from(declared) {
        return Err(SaveErrorKind::PropertyLengthMismatch {
            property: name,
            declared,
            actual: consumed,
        }
        .into());
    }

    Ok(Some(Property { name, index, value }))
}

/// Reads properties until the terminator sentinel.
pub(crate) fn read_property_list(r: &mut dyn Read) -> Result<Vec<Property>, SaveError> {
    let mut properties = Vec::new();
    while let Some(property) = read_property(r)? {
        properties.push(property);
    }
    Ok(properties)
}

/// Encodes one property frame. The payload is serialized to a scratch
/// buffer first because its length prefixes it on the wire.
pub(crate) fn write_property(property: &Property, w: &mut dyn Write) -> Result<(), SaveError> {
    let type_name = property.value.type_name();
    w.write_save_string(&property.name)?;
    w.write_save_string(type_name)?;

    // The registry is keyed by `type_name()`, so the entry always exists.
    let codec = &PROPERTY_CODECS[type_name];
    (codec.write)(property, w)
}

/// Writes a property list followed by the terminator sentinel.
pub(crate) fn write_property_list(
    properties: &[Property],
    w: &mut dyn Write,
) -> Result<(), SaveError> {
    for property in properties {
        write_property(property, w)?;
    }
    w.write_save_string(PROPERTY_TERMINATOR)
}

/// Emits `payload length, index, metadata, payload` for one frame.
fn write_frame(
    index: i32,
    metadata: &[u8],
    payload: &[u8],
    w: &mut dyn Write,
) -> Result<(), SaveError> {
    w.write_u32::<LE>(payload.len() as u32)?;
    w.write_i32::<LE>(index)?;
    w.write_all(metadata)?;
    w.write_all(payload)?;
    Ok(())
}

fn read_int(r: &mut dyn Read) -> Result<(PropertyValue, u64), SaveError> {
    r.read_reserved_byte()?;
    Ok((PropertyValue::Int(r.read_i32::<LE>()?), 4))
}

fn write_int(p: &Property, w: &mut dyn Write) -> Result<(), SaveError> {
    let PropertyValue::Int(v) = &p.value else {
        unreachable!()
    };
    write_frame(p.index, &[0], &v.to_le_bytes(), w)
}

fn read_int64(r: &mut dyn Read) -> Result<(PropertyValue, u64), SaveError> {
    r.read_reserved_byte()?;
    Ok((PropertyValue::Int64(r.read_i64::<LE>()?), 8))
}

fn write_int64(p: &Property, w: &mut dyn Write) -> Result<(), SaveError> {
    let PropertyValue::Int64(v) = &p.value else {
        unreachable!()
    };
    write_frame(p.index, &[0], &v.to_le_bytes(), w)
}

fn read_float(r: &mut dyn Read) -> Result<(PropertyValue, u64), SaveError> {
    r.read_reserved_byte()?;
    Ok((PropertyValue::Float(r.read_f32::<LE>()?), 4))
}

fn write_float(p: &Property, w: &mut dyn Write) -> Result<(), SaveError> {
    let PropertyValue::Float(v) = &p.value else {
        unreachable!()
    };
    write_frame(p.index, &[0], &v.to_le_bytes(), w)
}

// Bools keep their value in the metadata area; the declared payload is
// empty.
fn read_bool(r: &mut dyn Read) -> Result<(PropertyValue, u64), SaveError> {
    let value = r.read_u8()? != 0;
    r.read_reserved_byte()?;
    Ok((PropertyValue::Bool(value), 0))
}

fn write_bool(p: &Property, w: &mut dyn Write) -> Result<(), SaveError> {
    let PropertyValue::Bool(v) = &p.value else {
        unreachable!()
    };
    write_frame(p.index, &[u8::from(*v), 0], &[], w)
}

fn read_str(r: &mut dyn Read) -> Result<(PropertyValue, u64), SaveError> {
    r.read_reserved_byte()?;
    let mut payload = TrackedRead::new(r);
    let value = payload.read_save_string()?;
    let consumed = payload.consumed();
    Ok((PropertyValue::Str(value), consumed))
}

fn write_str(p: &Property, w: &mut dyn Write) -> Result<(), SaveError> {
    let PropertyValue::Str(v) = &p.value else {
        unreachable!()
    };
    let mut payload = Vec::new();
    payload.write_save_string(v)?;
    write_frame(p.index, &[0], &payload, w)
}

fn read_name(r: &mut dyn Read) -> Result<(PropertyValue, u64), SaveError> {
    match read_str(r)? {
        (PropertyValue::Str(value), consumed) => Ok((PropertyValue::Name(value), consumed)),
        _ => unreachable!(),
    }
}

fn write_name(p: &Property, w: &mut dyn Write) -> Result<(), SaveError> {
    let PropertyValue::Name(v) = &p.value else {
        unreachable!()
    };
    let mut payload = Vec::new();
    payload.write_save_string(v)?;
    write_frame(p.index, &[0], &payload, w)
}

fn read_enum(r: &mut dyn Read) -> Result<(PropertyValue, u64), SaveError> {
    let enum_type = r.read_save_string()?;
    r.read_reserved_byte()?;
    let mut payload = TrackedRead::new(r);
    let value = payload.read_save_string()?;
    let consumed = payload.consumed();
    Ok((PropertyValue::Enum { enum_type, value }, consumed))
}

fn write_enum(p: &Property, w: &mut dyn Write) -> Result<(), SaveError> {
    let PropertyValue::Enum { enum_type, value } = &p.value else {
        unreachable!()
    };
    let mut metadata = Vec::new();
    metadata.write_save_string(enum_type)?;
    metadata.push(0);
    let mut payload = Vec::new();
    payload.write_save_string(value)?;
    write_frame(p.index, &metadata, &payload, w)
}

fn read_byte(r: &mut dyn Read) -> Result<(PropertyValue, u64), SaveError> {
    let enum_type = r.read_save_string()?;
    r.read_reserved_byte()?;
    let mut payload = TrackedRead::new(r);
    let value = if enum_type == "None" {
        ByteValue::Raw(payload.read_u8()?)
    } else {
        ByteValue::Named(payload.read_save_string()?)
    };
    let consumed = payload.consumed();
    Ok((PropertyValue::Byte { enum_type, value }, consumed))
}

fn write_byte(p: &Property, w: &mut dyn Write) -> Result<(), SaveError> {
    let PropertyValue::Byte { enum_type, value } = &p.value else {
        unreachable!()
    };
    let mut metadata = Vec::new();
    metadata.write_save_string(enum_type)?;
    metadata.push(0);
    let mut payload = Vec::new();
    match value {
        ByteValue::Raw(b) => payload.push(*b),
        ByteValue::Named(name) => payload.write_save_string(name)?,
    }
    write_frame(p.index, &metadata, &payload, w)
}

fn read_object(r: &mut dyn Read) -> Result<(PropertyValue, u64), SaveError> {
    r.read_reserved_byte()?;
    let mut payload = TrackedRead::new(r);
    let reference = ObjectReference::read(&mut payload)?;
    let consumed = payload.consumed();
    Ok((PropertyValue::Object(reference), consumed))
}

fn write_object(p: &Property, w: &mut dyn Write) -> Result<(), SaveError> {
    let PropertyValue::Object(reference) = &p.value else {
        unreachable!()
    };
    let mut payload = Vec::new();
    reference.write(&mut payload)?;
    write_frame(p.index, &[0], &payload, w)
}

fn read_struct_value(
    struct_type: &str,
    r: &mut impl Read,
) -> Result<StructValue, SaveError> {
    match struct_type {
        "Vector" => Ok(StructValue::Vector(r.read_f32_array()?)),
        "Rotator" => Ok(StructValue::Rotator(r.read_f32_array()?)),
        "Quat" => Ok(StructValue::Quat(r.read_f32_array()?)),
        "LinearColor" => Ok(StructValue::LinearColor(r.read_f32_array()?)),
        _ => Ok(StructValue::Properties(read_property_list(r)?)),
    }
}

fn write_struct_value(value: &StructValue, w: &mut dyn Write) -> Result<(), SaveError> {
    match value {
        StructValue::Vector(v) | StructValue::Rotator(v) => w.write_f32_array(v),
        StructValue::Quat(v) | StructValue::LinearColor(v) => w.write_f32_array(v),
        StructValue::Properties(properties) => write_property_list(properties, w),
    }
}

fn read_struct(r: &mut dyn Read) -> Result<(PropertyValue, u64), SaveError> {
    let struct_type = r.read_save_string()?;
    let mut reserved = [0u32; 4];
    r.read_u32_into::<LE>(&mut reserved)?;
    r.read_reserved_byte()?;

    let mut payload = TrackedRead::new(r);
    let value = read_struct_value(&struct_type, &mut payload)?;
    let consumed = payload.consumed();

    Ok((
        PropertyValue::Struct {
            struct_type,
            reserved,
            value,
        },
        consumed,
    ))
}

fn write_struct(p: &Property, w: &mut dyn Write) -> Result<(), SaveError> {
    let PropertyValue::Struct {
        struct_type,
        reserved,
        value,
    } = &p.value
    else {
        unreachable!()
    };
    let mut metadata = Vec::new();
    metadata.write_save_string(struct_type)?;
    for v in reserved {
        metadata.write_u32::<LE>(*v)?;
    }
    metadata.push(0);
    let mut payload = Vec::new();
    write_struct_value(value, &mut payload)?;
    write_frame(p.index, &metadata, &payload, w)
}

fn read_array(r: &mut dyn Read) -> Result<(PropertyValue, u64), SaveError> {
    let element_type = r.read_save_string()?;
    r.read_reserved_byte()?;

    let mut payload = TrackedRead::new(r);
    let count = payload.read_u32::<LE>()? as usize;
    let value = match element_type.as_str() {
        "IntProperty" => {
            let mut v = vec![0i32; count];
            payload.read_i32_into::<LE>(&mut v)?;
            ArrayValue::Int(v)
        }
        "Int64Property" => {
            let mut v = vec![0i64; count];
            payload.read_i64_into::<LE>(&mut v)?;
            ArrayValue::Int64(v)
        }
        "FloatProperty" => {
            let mut v = vec![0f32; count];
            payload.read_f32_into::<LE>(&mut v)?;
            ArrayValue::Float(v)
        }
        "ByteProperty" => {
            let mut v = vec![0u8; count];
            payload.read_exact(&mut v)?;
            ArrayValue::Byte(v)
        }
        "StrProperty" | "NameProperty" => {
            let mut v = Vec::with_capacity(count);
            for _ in 0..count {
                v.push(payload.read_save_string()?);
            }
            ArrayValue::Str(v)
        }
        "EnumProperty" => {
            let mut v = Vec::with_capacity(count);
            for _ in 0..count {
                v.push(payload.read_save_string()?);
            }
            ArrayValue::Enum(v)
        }
        "ObjectProperty" => {
            let mut v = Vec::with_capacity(count);
            for _ in 0..count {
                v.push(ObjectReference::read(&mut payload)?);
            }
            ArrayValue::Object(v)
        }
        "StructProperty" => ArrayValue::Struct(read_struct_array(&mut payload, count)?),
        other => return Err(unknown_type(other)),
    };
    let consumed = payload.consumed();

    Ok((
        PropertyValue::Array {
            element_type,
            value,
        },
        consumed,
    ))
}

fn read_struct_array(
    r: &mut (impl Read + ?Sized),
    count: usize,
) -> Result<StructArray, SaveError> {
    let name = r.read_save_string()?;
    let inner_type = r.read_save_string()?;
    if inner_type != "StructProperty" {
        return Err(unknown_type(&inner_type));
    }
    let declared = r.read_u32::<LE>()?;
    let index = r.read_i32::<LE>()?;
    let struct_type = r.read_save_string()?;
    let mut reserved = [0u32; 4];
    r.read_u32_into::<LE>(&mut reserved)?;
    r.read_reserved_byte()?;

    let mut body = TrackedRead::new(r);
    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        elements.push(read_property_list(&mut body)?);
    }
    if body.consumed() != u64::from(declared) {
        return Err(SaveErrorKind::PropertyLengthMismatch {
            property: name,
            declared,
            actual: body.consumed(),
        }
        .into());
    }

    Ok(StructArray {
        name,
        index,
        struct_type,
        reserved,
        elements,
    })
}

fn write_struct_array(array: &StructArray, w: &mut dyn Write) -> Result<(), SaveError> {
    let mut body = Vec::new();
    for element in &array.elements {
        write_property_list(element, &mut body)?;
    }

    w.write_save_string(&array.name)?;
    w.write_save_string("StructProperty")?;
    w.write_u32::<LE>(body.len() as u32)?;
    w.write_i32::<LE>(array.index)?;
    w.write_save_string(&array.struct_type)?;
    for v in &array.reserved {
        w.write_u32::<LE>(*v)?;
    }
    w.write_u8(0)?;
    w.write_all(&body)?;
    Ok(())
}

fn write_array(p: &Property, w: &mut dyn Write) -> Result<(), SaveError> {
    let PropertyValue::Array {
        element_type,
        value,
    } = &p.value
    else {
        unreachable!()
    };
    let mut metadata = Vec::new();
    metadata.write_save_string(element_type)?;
    metadata.push(0);

    let mut payload = Vec::new();
    match value {
        ArrayValue::Int(v) => {
            payload.write_u32::<LE>(v.len() as u32)?;
            for x in v {
                payload.write_i32::<LE>(*x)?;
            }
        }
        ArrayValue::Int64(v) => {
            payload.write_u32::<LE>(v.len() as u32)?;
            for x in v {
                payload.write_i64::<LE>(*x)?;
            }
        }
        ArrayValue::Float(v) => {
            payload.write_u32::<LE>(v.len() as u32)?;
            payload.write_f32_array(v)?;
        }
        ArrayValue::Byte(v) => {
            payload.write_u32::<LE>(v.len() as u32)?;
            payload.write_all(v)?;
        }
        ArrayValue::Str(v) | ArrayValue::Enum(v) => {
            payload.write_u32::<LE>(v.len() as u32)?;
            for s in v {
                payload.write_save_string(s)?;
            }
        }
        ArrayValue::Object(v) => {
            payload.write_u32::<LE>(v.len() as u32)?;
            for reference in v {
                reference.write(&mut payload)?;
            }
        }
        ArrayValue::Struct(array) => {
            payload.write_u32::<LE>(array.elements.len() as u32)?;
            write_struct_array(array, &mut payload)?;
        }
    }

    write_frame(p.index, &metadata, &payload, w)
}

fn read_map_key(key_type: &str, r: &mut (impl Read + ?Sized)) -> Result<MapKey, SaveError> {
    match key_type {
        "IntProperty" => Ok(MapKey::Int(r.read_i32::<LE>()?)),
        "StrProperty" | "NameProperty" => Ok(MapKey::Str(r.read_save_string()?)),
        "ObjectProperty" => Ok(MapKey::Object(ObjectReference::read(r)?)),
        other => Err(unknown_type(other)),
    }
}

fn write_map_key(key: &MapKey, w: &mut (impl Write + ?Sized)) -> Result<(), SaveError> {
    match key {
        MapKey::Int(v) => Ok(w.write_i32::<LE>(*v)?),
        MapKey::Str(s) => w.write_save_string(s),
        MapKey::Object(reference) => reference.write(w),
    }
}

fn read_map(r: &mut dyn Read) -> Result<(PropertyValue, u64), SaveError> {
    let key_type = r.read_save_string()?;
    let value_type = r.read_save_string()?;
    r.read_reserved_byte()?;

    let mut payload = TrackedRead::new(r);
    let reserved = payload.read_u32::<LE>()?;
    let count = payload.read_u32::<LE>()? as usize;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let key = read_map_key(&key_type, &mut payload)?;
        let value = read_property_list(&mut payload)?;
        entries.push((key, value));
    }
    let consumed = payload.consumed();

    Ok((
        PropertyValue::Map {
            key_type,
            value_type,
            reserved,
            entries,
        },
        consumed,
    ))
}

fn write_map(p: &Property, w: &mut dyn Write) -> Result<(), SaveError> {
    let PropertyValue::Map {
        key_type,
        value_type,
        reserved,
        entries,
    } = &p.value
    else {
        unreachable!()
    };
    let mut metadata = Vec::new();
    metadata.write_save_string(key_type)?;
    metadata.write_save_string(value_type)?;
    metadata.push(0);

    let mut payload = Vec::new();
    payload.write_u32::<LE>(*reserved)?;
    payload.write_u32::<LE>(entries.len() as u32)?;
    for (key, value) in entries {
        write_map_key(key, &mut payload)?;
        write_property_list(value, &mut payload)?;
    }

    write_frame(p.index, &metadata, &payload, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(property: Property) {
        let mut buf = Vec::new();
        write_property(&property, &mut buf).unwrap();
        let mut cursor = Cursor::new(buf.as_slice());
        let decoded = read_property(&mut cursor).unwrap().unwrap();
        assert_eq!(decoded, property);
        assert_eq!(cursor.position() as usize, buf.len());
    }

    #[test]
    fn scalar_roundtrips() {
        roundtrip(Property::new("mPower", PropertyValue::Int(-42)));
        roundtrip(Property::new("mBigPower", PropertyValue::Int64(1 << 40)));
        roundtrip(Property::new("mSpeed", PropertyValue::Float(12.5)));
        roundtrip(Property::new("mIsProducing", PropertyValue::Bool(true)));
        roundtrip(Property::new(
            "mVisibility",
            PropertyValue::Str("Private".to_string()),
        ));
        roundtrip(Property::new(
            "mRowName",
            PropertyValue::Name("Desc_IronOre".to_string()),
        ));
    }

    #[test]
    fn object_property_wire_format() {
        // payload is a zero metadata byte, then two length-prefixed strings,
        // with the declared length covering only the strings
        let property = Property::new(
            "mOwnedPawn",
            PropertyValue::Object(ObjectReference::new(
                "Persistent_Level",
                "Persistent_Level:PersistentLevel.Char_Player_C_0",
            )),
        );
        let mut buf = Vec::new();
        write_property(&property, &mut buf).unwrap();

        // name and type strings, then the declared payload length
        let header = 4 + "mOwnedPawn".len() + 1 + 4 + "ObjectProperty".len() + 1;
        let declared = u32::from_le_bytes(buf[header..header + 4].try_into().unwrap());
        let strings = 4 + "Persistent_Level".len() + 1 + 4 + 48 + 1;
        assert_eq!(declared as usize, strings);
        assert_eq!(buf[header + 8], 0);

        roundtrip(property);
    }

    #[test]
    fn enum_and_byte_roundtrips() {
        roundtrip(Property::new(
            "mPendingPotential",
            PropertyValue::Enum {
                enum_type: "EProductionStatus".to_string(),
                value: "EProductionStatus::IsProducing".to_string(),
            },
        ));
        roundtrip(Property::new(
            "mFogOfWarRawData",
            PropertyValue::Byte {
                enum_type: "None".to_string(),
                value: ByteValue::Raw(0x7f),
            },
        ));
        roundtrip(Property::new(
            "mGamePhase",
            PropertyValue::Byte {
                enum_type: "EGamePhase".to_string(),
                value: ByteValue::Named("EGP_MidGame".to_string()),
            },
        ));
    }

    #[test]
    fn struct_roundtrips() {
        roundtrip(Property::new(
            "mExtractionOffset",
            PropertyValue::Struct {
                struct_type: "Vector".to_string(),
                reserved: [0; 4],
                value: StructValue::Vector([1.0, -2.0, 300.0]),
            },
        ));
        roundtrip(Property::new(
            "mPrimaryColor",
            PropertyValue::Struct {
                struct_type: "LinearColor".to_string(),
                reserved: [0; 4],
                value: StructValue::LinearColor([0.1, 0.2, 0.3, 1.0]),
            },
        ));
        roundtrip(Property::new(
            "mInventoryStack",
            PropertyValue::Struct {
                struct_type: "InventoryStack".to_string(),
                reserved: [0; 4],
                value: StructValue::Properties(vec![Property::new(
                    "NumItems",
                    PropertyValue::Int(50),
                )]),
            },
        ));
    }

    #[test]
    fn array_roundtrips() {
        roundtrip(Property::new(
            "mActiveRecipes",
            PropertyValue::Array {
                element_type: "IntProperty".to_string(),
                value: ArrayValue::Int(vec![1, 2, 3]),
            },
        ));
        roundtrip(Property::new(
            "mRemovedInstances",
            PropertyValue::Array {
                element_type: "ObjectProperty".to_string(),
                value: ArrayValue::Object(vec![
                    ObjectReference::new("Persistent_Level", "Persistent_Level:Foo_1"),
                    ObjectReference::new("Persistent_Level", "Persistent_Level:Foo_2"),
                ]),
            },
        ));
        roundtrip(Property::new(
            "mInventoryStacks",
            PropertyValue::Array {
                element_type: "StructProperty".to_string(),
                value: ArrayValue::Struct(StructArray {
                    name: "mInventoryStacks".to_string(),
                    index: 0,
                    struct_type: "InventoryStack".to_string(),
                    reserved: [0; 4],
                    elements: vec![
                        vec![Property::new("NumItems", PropertyValue::Int(10))],
                        Vec::new(),
                    ],
                }),
            },
        ));
    }

    #[test]
    fn map_roundtrip() {
        roundtrip(Property::new(
            "mSaveData",
            PropertyValue::Map {
                key_type: "IntProperty".to_string(),
                value_type: "StructProperty".to_string(),
                reserved: 0,
                entries: vec![(
                    MapKey::Int(7),
                    vec![Property::new("mCompleted", PropertyValue::Bool(false))],
                )],
            },
        ));
    }

    #[test]
    fn unknown_type_name_fails() {
        let mut buf = Vec::new();
        buf.write_save_string("mMystery").unwrap();
        buf.write_save_string("DelegateProperty").unwrap();
        buf.write_u32::<LE>(0).unwrap();
        buf.write_i32::<LE>(0).unwrap();

        let err = read_property(&mut Cursor::new(buf.as_slice())).unwrap_err();
        assert!(matches!(
            err.kind(),
            SaveErrorKind::UnknownPropertyType { name } if name == "DelegateProperty"
        ));
    }

    #[test]
    fn declared_length_mismatch_fails() {
        let mut buf = Vec::new();
        buf.write_save_string("mPower").unwrap();
        buf.write_save_string("IntProperty").unwrap();
        buf.write_u32::<LE>(8).unwrap(); // an i32 payload is 4 bytes
        buf.write_i32::<LE>(0).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_i32::<LE>(5).unwrap();

        let err = read_property(&mut Cursor::new(buf.as_slice())).unwrap_err();
        assert!(matches!(
            err.kind(),
            SaveErrorKind::PropertyLengthMismatch {
                declared: 8,
                actual: 4,
                ..
            }
        ));
    }

    #[test]
    fn terminator_ends_list() {
        let mut buf = Vec::new();
        write_property_list(
            &[Property::new("mPower", PropertyValue::Int(1))],
            &mut buf,
        )
        .unwrap();

        let mut cursor = Cursor::new(buf.as_slice());
        let list = read_property_list(&mut cursor).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(cursor.position() as usize, buf.len());
    }
}
