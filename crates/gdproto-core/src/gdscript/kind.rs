//! Wire-kind classification.
//!
//! Maps the primitive wire kinds of the schema model onto the symbolic
//! `DATA_TYPE` tags the runtime registers fields under. Classification works
//! on the raw descriptor type number rather than the resolved kind, so that
//! values outside the supported vocabulary (groups, or types added by a newer
//! schema model) stay observable and fail instead of being silently coerced.

use prost_reflect::FieldDescriptor;
use prost_types::field_descriptor_proto::Type;

use crate::error::{Error, Result};

/// Symbolic type tag understood by the runtime's `DATA_TYPE` enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TypeTag {
    Bool,
    Int32,
    Sint32,
    Sfixed32,
    Int64,
    Sint64,
    Sfixed64,
    Uint32,
    Fixed32,
    Uint64,
    Fixed64,
    Float,
    Double,
    String,
    Bytes,
    Message,
    Enum,
    /// Synthetic tag for map fields, which the runtime stores specially even
    /// though the wire encodes them as repeated entry messages
    Map,
}

impl TypeTag {
    /// Classifies a raw descriptor type number.
    ///
    /// Total over the known primitive kinds; anything else (notably
    /// `TYPE_GROUP`) fails with [`Error::UnrecognizedKind`].
    pub fn from_proto_type(ty: i32) -> Result<Self> {
        match Type::try_from(ty) {
            Ok(Type::Bool) => Ok(TypeTag::Bool),
            Ok(Type::Int32) => Ok(TypeTag::Int32),
            Ok(Type::Sint32) => Ok(TypeTag::Sint32),
            Ok(Type::Sfixed32) => Ok(TypeTag::Sfixed32),
            Ok(Type::Int64) => Ok(TypeTag::Int64),
            Ok(Type::Sint64) => Ok(TypeTag::Sint64),
            Ok(Type::Sfixed64) => Ok(TypeTag::Sfixed64),
            Ok(Type::Uint32) => Ok(TypeTag::Uint32),
            Ok(Type::Fixed32) => Ok(TypeTag::Fixed32),
            Ok(Type::Uint64) => Ok(TypeTag::Uint64),
            Ok(Type::Fixed64) => Ok(TypeTag::Fixed64),
            Ok(Type::Float) => Ok(TypeTag::Float),
            Ok(Type::Double) => Ok(TypeTag::Double),
            Ok(Type::String) => Ok(TypeTag::String),
            Ok(Type::Bytes) => Ok(TypeTag::Bytes),
            Ok(Type::Message) => Ok(TypeTag::Message),
            Ok(Type::Enum) => Ok(TypeTag::Enum),
            Ok(Type::Group) | Err(_) => Err(Error::unrecognized_kind(proto_type_name(ty))),
        }
    }

    /// Classifies a field, yielding [`TypeTag::Map`] for map fields regardless
    /// of their underlying kind and deferring to [`TypeTag::from_proto_type`]
    /// otherwise.
    pub fn of(field: &FieldDescriptor) -> Result<Self> {
        if field.is_map() {
            return Ok(TypeTag::Map);
        }
        Self::from_proto_type(raw_type(field))
    }

    /// Returns the tag's name as the runtime spells it
    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Bool => "BOOL",
            TypeTag::Int32 => "INT32",
            TypeTag::Sint32 => "SINT32",
            TypeTag::Sfixed32 => "SFIXED32",
            TypeTag::Int64 => "INT64",
            TypeTag::Sint64 => "SINT64",
            TypeTag::Sfixed64 => "SFIXED64",
            TypeTag::Uint32 => "UINT32",
            TypeTag::Fixed32 => "FIXED32",
            TypeTag::Uint64 => "UINT64",
            TypeTag::Fixed64 => "FIXED64",
            TypeTag::Float => "FLOAT",
            TypeTag::Double => "DOUBLE",
            TypeTag::String => "STRING",
            TypeTag::Bytes => "BYTES",
            TypeTag::Message => "MESSAGE",
            TypeTag::Enum => "ENUM",
            TypeTag::Map => "MAP",
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase protobuf name of a raw descriptor type number ("string",
/// "group", ...), falling back to the number itself when it has no name
pub(crate) fn proto_type_name(ty: i32) -> String {
    match Type::try_from(ty) {
        Ok(known) => known
            .as_str_name()
            .trim_start_matches("TYPE_")
            .to_ascii_lowercase(),
        Err(_) => ty.to_string(),
    }
}

/// Raw wire type number of a field, as recorded in the descriptor
pub(crate) fn raw_type(field: &FieldDescriptor) -> i32 {
    field.field_descriptor_proto().r#type.unwrap_or_default()
}
