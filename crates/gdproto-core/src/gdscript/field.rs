//! Field registration metadata.
//!
//! The core mapping algorithm: one schema field descriptor in, one
//! [`FieldMetadata`] out, describing exactly how the field must be registered
//! with the runtime so it can encode and decode the field's wire bytes later.
//! The registration's shape is captured as a tagged variant carrying only the
//! data relevant to that shape; the positional argument list the runtime
//! actually parses is rendered from it by
//! [`FieldMetadata::registration_args`].

use std::fmt;

use prost_reflect::{FieldDescriptor, Kind};

use super::kind::{raw_type, TypeTag};
use crate::error::Result;

/// How a field is stored and registered, beyond its base type tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    /// Plain singular scalar
    Singular,
    /// Repeated scalar, encoded as one tag-value pair per element
    Repeated,
    /// Repeated scalar, encoded as a single contiguous run
    Packed,
    /// Embedded message, registered by its type reference
    Message {
        /// Simple name of the referenced message
        type_name: String,
    },
    /// Enum, registered by its type reference
    Enum {
        /// Simple name of the referenced enum
        type_name: String,
    },
    /// Map, wire-encoded as repeated entry messages with implicit key/value
    /// sub-fields
    Map {
        /// Resolved key type
        key: MapEntryType,
        /// Resolved value type
        value: MapEntryType,
    },
}

/// Resolved type of a map entry's key or value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEntryType {
    /// A primitive kind, registered by its symbolic tag
    Tag(TypeTag),
    /// A message or enum kind, registered by the target type's simple name
    Named(String),
}

impl MapEntryType {
    fn to_arg(&self) -> Arg {
        match self {
            MapEntryType::Tag(tag) => Arg::Tag(*tag),
            MapEntryType::Named(name) => Arg::Class(name.clone()),
        }
    }
}

/// One positional argument of a field registration call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Quoted string literal
    Str(String),
    /// Integer literal (field numbers and `-1` filler sentinels)
    Int(i64),
    /// Symbolic type tag, rendered as `proto.DATA_TYPE.<TAG>`
    Tag(TypeTag),
    /// Bare class reference (a generated message or enum name)
    Class(String),
    /// Boolean literal
    Bool(bool),
    /// The `null` literal
    Null,
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Str(s) => write!(f, "\"{s}\""),
            Arg::Int(n) => write!(f, "{n}"),
            Arg::Tag(tag) => write!(f, "proto.DATA_TYPE.{tag}"),
            Arg::Class(name) => f.write_str(name),
            Arg::Bool(b) => write!(f, "{b}"),
            Arg::Null => f.write_str("null"),
        }
    }
}

/// Registration metadata for a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    /// Field name as declared in the schema
    pub name: String,
    /// Wire field number
    pub number: u32,
    /// Symbolic type tag ([`TypeTag::Map`] for map fields)
    pub tag: TypeTag,
    /// Storage shape
    pub shape: FieldShape,
    /// Name of the containing oneof group, if any
    pub oneof: Option<String>,
}

impl FieldMetadata {
    /// Builds the registration metadata for a field.
    ///
    /// Fails with [`Error::UnrecognizedKind`](crate::Error::UnrecognizedKind)
    /// if the field's kind, or a map field's key or value kind, is outside
    /// the supported set.
    pub fn from_field(field: &FieldDescriptor) -> Result<Self> {
        let tag = TypeTag::of(field)?;

        let shape = match field.kind() {
            Kind::Message(entry) if field.is_map() => FieldShape::Map {
                key: resolve_entry(&entry.map_entry_key_field())?,
                value: resolve_entry(&entry.map_entry_value_field())?,
            },
            Kind::Message(message) => FieldShape::Message {
                type_name: message.name().to_owned(),
            },
            Kind::Enum(enum_) => FieldShape::Enum {
                type_name: enum_.name().to_owned(),
            },
            _ if field.is_packed() => FieldShape::Packed,
            _ if field.is_list() => FieldShape::Repeated,
            _ => FieldShape::Singular,
        };

        Ok(FieldMetadata {
            name: field.name().to_owned(),
            number: field.number(),
            tag,
            shape,
            oneof: field.containing_oneof().map(|oneof| oneof.name().to_owned()),
        })
    }

    /// Renders the positional argument list of the registration call.
    ///
    /// The runtime reads these arguments by fixed offset. A member of a oneof
    /// always carries the group name as trailing argument 9; branches with
    /// fewer positions pad with a boolean pair and `-1, -1` filler so the
    /// name's offset never moves.
    pub fn registration_args(&self) -> Vec<Arg> {
        let mut args = vec![
            Arg::Str(self.name.clone()),
            Arg::Int(i64::from(self.number)),
            Arg::Tag(self.tag),
        ];
        let oneof = self.oneof.as_ref();

        match &self.shape {
            FieldShape::Message { type_name } | FieldShape::Enum { type_name } => {
                args.push(Arg::Class(type_name.clone()));
                if let Some(oneof) = oneof {
                    args.extend([
                        Arg::Bool(false),
                        Arg::Bool(true),
                        Arg::Int(-1),
                        Arg::Int(-1),
                        Arg::Str(oneof.clone()),
                    ]);
                }
            }
            // Maps reuse the filler slots for their key and value types.
            FieldShape::Map { key, value } => {
                args.extend([
                    Arg::Null,
                    Arg::Bool(true),
                    Arg::Bool(false),
                    key.to_arg(),
                    value.to_arg(),
                ]);
                if let Some(oneof) = oneof {
                    args.push(Arg::Str(oneof.clone()));
                }
            }
            FieldShape::Repeated => {
                args.extend([Arg::Null, Arg::Bool(true)]);
                if let Some(oneof) = oneof {
                    args.extend([
                        Arg::Bool(true),
                        Arg::Int(-1),
                        Arg::Int(-1),
                        Arg::Str(oneof.clone()),
                    ]);
                }
            }
            FieldShape::Packed => {
                args.extend([Arg::Null, Arg::Bool(true), Arg::Bool(true)]);
                if let Some(oneof) = oneof {
                    args.extend([Arg::Int(-1), Arg::Int(-1), Arg::Str(oneof.clone())]);
                }
            }
            FieldShape::Singular => {
                if let Some(oneof) = oneof {
                    args.extend([
                        Arg::Null,
                        Arg::Bool(false),
                        Arg::Bool(true),
                        Arg::Int(-1),
                        Arg::Int(-1),
                        Arg::Str(oneof.clone()),
                    ]);
                }
            }
        }

        args
    }

    /// GDScript type used for the field's generated accessor pair.
    ///
    /// Infallible: the kind was validated when the metadata was built.
    pub fn accessor_type(&self) -> String {
        match (&self.shape, self.tag) {
            (FieldShape::Map { .. }, _) => "Dictionary".to_owned(),
            (FieldShape::Message { type_name }, _) | (FieldShape::Enum { type_name }, _) => {
                type_name.clone()
            }
            (_, TypeTag::Bool) => "bool".to_owned(),
            (_, TypeTag::Float | TypeTag::Double) => "float".to_owned(),
            (_, TypeTag::String) => "String".to_owned(),
            (_, TypeTag::Bytes) => "PackedByteArray".to_owned(),
            // The remaining scalar tags are the integer family.
            (_, _) => "int".to_owned(),
        }
    }
}

/// Resolves a map entry's key or value field.
///
/// Keys and values cannot themselves be maps, so classification is kind-level
/// here; MESSAGE and ENUM kinds substitute the referenced type's simple name
/// for the symbolic tag.
fn resolve_entry(field: &FieldDescriptor) -> Result<MapEntryType> {
    let tag = TypeTag::from_proto_type(raw_type(field))?;
    match field.kind() {
        Kind::Message(message) => Ok(MapEntryType::Named(message.name().to_owned())),
        Kind::Enum(enum_) => Ok(MapEntryType::Named(enum_.name().to_owned())),
        _ => Ok(MapEntryType::Tag(tag)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use prost_reflect::DescriptorPool;
    use prost_types::field_descriptor_proto::{Label, Type};
    use prost_types::{
        DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
        FileDescriptorProto, FileDescriptorSet, MessageOptions, OneofDescriptorProto,
    };

    fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_owned()),
            number: Some(number),
            label: Some(Label::Optional as i32),
            r#type: Some(ty as i32),
            ..Default::default()
        }
    }

    fn repeated(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
        FieldDescriptorProto {
            label: Some(Label::Repeated as i32),
            ..scalar(name, number, ty)
        }
    }

    fn color_enum() -> EnumDescriptorProto {
        EnumDescriptorProto {
            name: Some("Color".to_owned()),
            value: vec![
                EnumValueDescriptorProto {
                    name: Some("COLOR_UNSPECIFIED".to_owned()),
                    number: Some(0),
                    ..Default::default()
                },
                EnumValueDescriptorProto {
                    name: Some("COLOR_RED".to_owned()),
                    number: Some(1),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    /// Pool containing an `Item` message, a `Color` enum and the message
    /// under test (named `Test`).
    fn pool_with(message: DescriptorProto) -> DescriptorPool {
        let file = FileDescriptorProto {
            name: Some("test.proto".to_owned()),
            syntax: Some("proto3".to_owned()),
            enum_type: vec![color_enum()],
            message_type: vec![
                DescriptorProto {
                    name: Some("Item".to_owned()),
                    ..Default::default()
                },
                message,
            ],
            ..Default::default()
        };
        DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: vec![file] })
            .expect("fixture descriptor set is valid")
    }

    fn metadata_for(message: DescriptorProto, field_name: &str) -> FieldMetadata {
        let pool = pool_with(message);
        let message = pool.get_message_by_name("Test").unwrap();
        let field = message.get_field_by_name(field_name).unwrap();
        FieldMetadata::from_field(&field).unwrap()
    }

    #[test]
    fn test_singular_scalar_has_base_triple_only() {
        let metadata = metadata_for(
            DescriptorProto {
                name: Some("Test".to_owned()),
                field: vec![scalar("label", 1, Type::String)],
                ..Default::default()
            },
            "label",
        );

        assert_eq!(metadata.tag, TypeTag::String);
        assert_eq!(metadata.shape, FieldShape::Singular);
        assert_eq!(metadata.oneof, None);
        assert_eq!(
            metadata.registration_args(),
            vec![
                Arg::Str("label".to_owned()),
                Arg::Int(1),
                Arg::Tag(TypeTag::String),
            ]
        );
    }

    #[test]
    fn test_repeated_unpackable_scalar() {
        let metadata = metadata_for(
            DescriptorProto {
                name: Some("Test".to_owned()),
                field: vec![repeated("tags", 4, Type::String)],
                ..Default::default()
            },
            "tags",
        );

        assert_eq!(metadata.shape, FieldShape::Repeated);
        assert_eq!(
            metadata.registration_args(),
            vec![
                Arg::Str("tags".to_owned()),
                Arg::Int(4),
                Arg::Tag(TypeTag::String),
                Arg::Null,
                Arg::Bool(true),
            ]
        );
    }

    #[test]
    fn test_repeated_numeric_scalar_is_packed() {
        // proto3 packs repeated numeric scalars unless the schema opts out.
        let metadata = metadata_for(
            DescriptorProto {
                name: Some("Test".to_owned()),
                field: vec![repeated("scores", 2, Type::Int32)],
                ..Default::default()
            },
            "scores",
        );

        assert_eq!(metadata.shape, FieldShape::Packed);
        assert_eq!(
            metadata.registration_args(),
            vec![
                Arg::Str("scores".to_owned()),
                Arg::Int(2),
                Arg::Tag(TypeTag::Int32),
                Arg::Null,
                Arg::Bool(true),
                Arg::Bool(true),
            ]
        );
    }

    #[test]
    fn test_message_field_registers_type_reference() {
        let metadata = metadata_for(
            DescriptorProto {
                name: Some("Test".to_owned()),
                field: vec![FieldDescriptorProto {
                    type_name: Some(".Item".to_owned()),
                    ..scalar("item", 3, Type::Message)
                }],
                ..Default::default()
            },
            "item",
        );

        assert_eq!(metadata.tag, TypeTag::Message);
        assert_eq!(
            metadata.shape,
            FieldShape::Message {
                type_name: "Item".to_owned()
            }
        );
        assert_eq!(
            metadata.registration_args(),
            vec![
                Arg::Str("item".to_owned()),
                Arg::Int(3),
                Arg::Tag(TypeTag::Message),
                Arg::Class("Item".to_owned()),
            ]
        );
    }

    #[test]
    fn test_enum_field_registers_type_reference() {
        let metadata = metadata_for(
            DescriptorProto {
                name: Some("Test".to_owned()),
                field: vec![FieldDescriptorProto {
                    type_name: Some(".Color".to_owned()),
                    ..scalar("color", 5, Type::Enum)
                }],
                ..Default::default()
            },
            "color",
        );

        assert_eq!(
            metadata.registration_args(),
            vec![
                Arg::Str("color".to_owned()),
                Arg::Int(5),
                Arg::Tag(TypeTag::Enum),
                Arg::Class("Color".to_owned()),
            ]
        );
    }

    fn map_message(value_field: FieldDescriptorProto) -> DescriptorProto {
        DescriptorProto {
            name: Some("Test".to_owned()),
            field: vec![FieldDescriptorProto {
                type_name: Some(".Test.CountsEntry".to_owned()),
                ..repeated("counts", 1, Type::Message)
            }],
            nested_type: vec![DescriptorProto {
                name: Some("CountsEntry".to_owned()),
                field: vec![scalar("key", 1, Type::String), value_field],
                options: Some(MessageOptions {
                    map_entry: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_map_with_enum_value_resolves_the_enum_name() {
        let value = FieldDescriptorProto {
            type_name: Some(".Color".to_owned()),
            ..scalar("value", 2, Type::Enum)
        };
        let metadata = metadata_for(map_message(value), "counts");

        assert_eq!(metadata.tag, TypeTag::Map);
        assert_eq!(
            metadata.registration_args(),
            vec![
                Arg::Str("counts".to_owned()),
                Arg::Int(1),
                Arg::Tag(TypeTag::Map),
                Arg::Null,
                Arg::Bool(true),
                Arg::Bool(false),
                Arg::Tag(TypeTag::String),
                Arg::Class("Color".to_owned()),
            ]
        );
    }

    #[test]
    fn test_map_with_message_value_resolves_the_message_name() {
        let value = FieldDescriptorProto {
            type_name: Some(".Item".to_owned()),
            ..scalar("value", 2, Type::Message)
        };
        let metadata = metadata_for(map_message(value), "counts");

        assert_eq!(
            metadata.shape,
            FieldShape::Map {
                key: MapEntryType::Tag(TypeTag::String),
                value: MapEntryType::Named("Item".to_owned()),
            }
        );
    }

    #[test]
    fn test_map_with_scalar_value_keeps_both_tags() {
        let metadata = metadata_for(map_message(scalar("value", 2, Type::Uint64)), "counts");

        assert_eq!(
            metadata.shape,
            FieldShape::Map {
                key: MapEntryType::Tag(TypeTag::String),
                value: MapEntryType::Tag(TypeTag::Uint64),
            }
        );
    }

    fn oneof_message(fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
        DescriptorProto {
            name: Some("Test".to_owned()),
            field: fields
                .into_iter()
                .map(|field| FieldDescriptorProto {
                    oneof_index: Some(0),
                    ..field
                })
                .collect(),
            oneof_decl: vec![OneofDescriptorProto {
                name: Some("choice".to_owned()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_singular_scalar_in_oneof_pads_to_the_trailing_name() {
        let metadata = metadata_for(oneof_message(vec![scalar("yes", 1, Type::Bool)]), "yes");

        assert_eq!(metadata.oneof.as_deref(), Some("choice"));
        assert_eq!(
            metadata.registration_args(),
            vec![
                Arg::Str("yes".to_owned()),
                Arg::Int(1),
                Arg::Tag(TypeTag::Bool),
                Arg::Null,
                Arg::Bool(false),
                Arg::Bool(true),
                Arg::Int(-1),
                Arg::Int(-1),
                Arg::Str("choice".to_owned()),
            ]
        );
    }

    #[test]
    fn test_message_in_oneof_pads_after_the_type_reference() {
        let field = FieldDescriptorProto {
            type_name: Some(".Item".to_owned()),
            ..scalar("item", 2, Type::Message)
        };
        let metadata = metadata_for(oneof_message(vec![field]), "item");

        assert_eq!(
            metadata.registration_args(),
            vec![
                Arg::Str("item".to_owned()),
                Arg::Int(2),
                Arg::Tag(TypeTag::Message),
                Arg::Class("Item".to_owned()),
                Arg::Bool(false),
                Arg::Bool(true),
                Arg::Int(-1),
                Arg::Int(-1),
                Arg::Str("choice".to_owned()),
            ]
        );
    }

    #[test]
    fn test_oneof_membership_only_appends_trailing_arguments() {
        let shapes = [
            (FieldShape::Singular, TypeTag::Int32),
            (FieldShape::Repeated, TypeTag::String),
            (FieldShape::Packed, TypeTag::Sint64),
            (
                FieldShape::Message {
                    type_name: "Item".to_owned(),
                },
                TypeTag::Message,
            ),
            (
                FieldShape::Enum {
                    type_name: "Color".to_owned(),
                },
                TypeTag::Enum,
            ),
            (
                FieldShape::Map {
                    key: MapEntryType::Tag(TypeTag::String),
                    value: MapEntryType::Tag(TypeTag::Int32),
                },
                TypeTag::Map,
            ),
        ];

        for (shape, tag) in shapes {
            let without = FieldMetadata {
                name: "field".to_owned(),
                number: 1,
                tag,
                shape,
                oneof: None,
            };
            let with = FieldMetadata {
                oneof: Some("group".to_owned()),
                ..without.clone()
            };

            let plain = without.registration_args();
            let grouped = with.registration_args();

            // Earlier positions are untouched; the group name is always
            // trailing argument 9.
            assert_eq!(plain[..], grouped[..plain.len()]);
            assert_eq!(grouped.len(), 9);
            assert_eq!(grouped.last(), Some(&Arg::Str("group".to_owned())));
        }
    }

    #[test]
    fn test_accessor_types() {
        let cases = [
            (FieldShape::Singular, TypeTag::Bool, "bool"),
            (FieldShape::Singular, TypeTag::Fixed32, "int"),
            (FieldShape::Repeated, TypeTag::Sint64, "int"),
            (FieldShape::Packed, TypeTag::Double, "float"),
            (FieldShape::Singular, TypeTag::Float, "float"),
            (FieldShape::Singular, TypeTag::String, "String"),
            (FieldShape::Singular, TypeTag::Bytes, "PackedByteArray"),
        ];
        for (shape, tag, expected) in cases {
            let metadata = FieldMetadata {
                name: "field".to_owned(),
                number: 1,
                tag,
                shape,
                oneof: None,
            };
            assert_eq!(metadata.accessor_type(), expected);
        }

        let message = FieldMetadata {
            name: "item".to_owned(),
            number: 1,
            tag: TypeTag::Message,
            shape: FieldShape::Message {
                type_name: "Item".to_owned(),
            },
            oneof: None,
        };
        assert_eq!(message.accessor_type(), "Item");

        let map = FieldMetadata {
            name: "counts".to_owned(),
            number: 1,
            tag: TypeTag::Map,
            shape: FieldShape::Map {
                key: MapEntryType::Tag(TypeTag::String),
                value: MapEntryType::Named("Item".to_owned()),
            },
            oneof: None,
        };
        assert_eq!(map.accessor_type(), "Dictionary");
    }

    #[test]
    fn test_arg_display() {
        assert_eq!(Arg::Str("choice".to_owned()).to_string(), "\"choice\"");
        assert_eq!(Arg::Int(-1).to_string(), "-1");
        assert_eq!(Arg::Tag(TypeTag::String).to_string(), "proto.DATA_TYPE.STRING");
        assert_eq!(Arg::Class("Item".to_owned()).to_string(), "Item");
        assert_eq!(Arg::Bool(false).to_string(), "false");
        assert_eq!(Arg::Null.to_string(), "null");
    }

    #[test]
    fn test_classify_field_prefers_map() {
        let pool = pool_with(map_message(scalar("value", 2, Type::Int32)));
        let message = pool.get_message_by_name("Test").unwrap();
        let field = message.get_field_by_name("counts").unwrap();

        // The underlying kind is MESSAGE (the entry type); map-ness wins.
        assert_eq!(TypeTag::of(&field).unwrap(), TypeTag::Map);
    }
}
