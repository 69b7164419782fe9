//! GDScript declaration emission.
//!
//! Walks a resolved schema file and renders one generated script per file:
//! enum declarations, one message class per message with its
//! field-registration block, a typed accessor pair per field, and one untyped
//! accessor pair per oneof group. What to register for each field is decided
//! by [`FieldMetadata`]; this module only decides ordering and layout.

mod field;
mod kind;

use prost_reflect::{EnumDescriptor, FileDescriptor, MessageDescriptor};
use tracing::{debug, trace};

use crate::error::Result;

pub use field::{Arg, FieldMetadata, FieldShape, MapEntryType};
pub use kind::TypeTag;

use kind::{proto_type_name, raw_type};

/// Default resource path of the runtime support script
pub const RUNTIME_PRELOAD_PATH: &str = "res://addons/godot-protobuf/proto.gd";

/// Configuration for GDScript generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Resource path preloaded as `proto` at the top of every generated file
    pub runtime_preload: String,
    /// Include `@generated` provenance comments on declarations
    pub include_comments: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            runtime_preload: RUNTIME_PRELOAD_PATH.to_owned(),
            include_comments: true,
        }
    }
}

impl GeneratorConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the resource path of the runtime support script
    pub fn runtime_preload(mut self, path: impl Into<String>) -> Self {
        self.runtime_preload = path.into();
        self
    }

    /// Sets whether to include `@generated` provenance comments
    pub fn include_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }
}

/// Generates GDScript binding scripts from resolved schema files
#[derive(Debug, Clone)]
pub struct GdScriptGenerator {
    config: GeneratorConfig,
}

impl Default for GdScriptGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl GdScriptGenerator {
    /// Creates a new generator with default configuration
    pub fn new() -> Self {
        Self {
            config: GeneratorConfig::default(),
        }
    }

    /// Creates a new generator with custom configuration
    pub fn with_config(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generates the binding script for one schema file.
    ///
    /// Declaration order follows the schema exactly: enums first, then
    /// messages, each with its fields in declared order. An unrecognized
    /// field kind aborts the whole file; no partial artifact is returned.
    pub fn generate(&self, file: &FileDescriptor) -> Result<String> {
        debug!("generating bindings for {}", file.name());

        let mut lines = Lines::new();
        self.write_header(&mut lines, file);

        for enum_ in file.enums() {
            self.write_enum(&mut lines, &enum_);
        }
        for message in file.messages() {
            self.write_message(&mut lines, &message)?;
        }

        Ok(lines.into_string())
    }

    fn write_header(&self, lines: &mut Lines, file: &FileDescriptor) {
        let proto = file.file_descriptor_proto();

        lines.push("## @generated by protoc-gen-godot");
        lines.push(format!("## @generated from {}", file.name()));
        lines.push("##");
        let syntax = match proto.syntax() {
            "" => "proto2",
            other => other,
        };
        lines.push(format!("## Proto syntax: {syntax}"));
        if proto.edition.is_some() {
            lines.push(format!("## Edition: {}", proto.edition().as_str_name()));
        }
        lines.blank();
        lines.push(format!(
            "const proto = preload(\"{}\")",
            self.config.runtime_preload
        ));
        lines.blank();
    }

    fn write_enum(&self, lines: &mut Lines, enum_: &EnumDescriptor) {
        trace!("emitting enum {}", enum_.name());

        if self.config.include_comments {
            lines.push(format!("## @generated from enum {}", enum_.name()));
        }
        lines.push(format!("enum {} {{", enum_.name()));
        for value in enum_.values() {
            let decl = format!("\t{} = {},", value.name(), value.number());
            if self.config.include_comments {
                lines.push(format!(
                    "{decl} ## @generated from enum value: {} = {}",
                    value.name(),
                    value.number()
                ));
            } else {
                lines.push(decl);
            }
        }
        lines.push("}");
        lines.blank();
        lines.blank();
    }

    fn write_message(&self, lines: &mut Lines, message: &MessageDescriptor) -> Result<()> {
        trace!("emitting message {}", message.name());

        // Resolve every field up front: an unrecognized kind must abort the
        // file before any of this message's lines land in the buffer.
        let mut fields = Vec::new();
        for field in message.fields() {
            let metadata = FieldMetadata::from_field(&field)?;
            fields.push((field, metadata));
        }

        if self.config.include_comments {
            lines.push(format!("## @generated from message {}", message.name()));
        }
        lines.push(format!(
            "class {} extends proto.ProtobufMessage:",
            message.name()
        ));
        lines.push(format!(
            "\tstatic func from_bytes(bytes: PackedByteArray) -> {}:",
            message.name()
        ));
        lines.push(format!(
            "\t\treturn proto.ProtobufDecoder.decode_message({}.new(), bytes)",
            message.name()
        ));
        lines.blank();

        if fields.is_empty() {
            return Ok(());
        }

        lines.push("\tfunc _init_fields():");
        for (field, metadata) in &fields {
            let args = metadata
                .registration_args()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let call = format!("\t\tadd_field({args})");
            if self.config.include_comments {
                lines.push(format!(
                    "{call} ## @generated from field: {} {} = {}",
                    proto_type_name(raw_type(field)),
                    field.name(),
                    field.number()
                ));
            } else {
                lines.push(call);
            }
        }
        lines.blank();

        for (_, metadata) in &fields {
            self.write_accessors(lines, metadata);
        }

        // One accessor pair per oneof group, in order of each group's first
        // member; later members are skipped.
        let mut seen = Vec::new();
        for (_, metadata) in &fields {
            if let Some(oneof) = &metadata.oneof {
                if seen.contains(oneof) {
                    continue;
                }
                seen.push(oneof.clone());
                self.write_oneof_accessors(lines, oneof);
            }
        }

        lines.blank();
        Ok(())
    }

    fn write_accessors(&self, lines: &mut Lines, metadata: &FieldMetadata) {
        let ty = metadata.accessor_type();
        lines.push(format!("\tfunc get_{}() -> {}:", metadata.name, ty));
        lines.push(format!(
            "\t\treturn get_field(\"{}\") as {}",
            metadata.name, ty
        ));
        lines.blank();
        lines.push(format!("\tfunc set_{}(value: {}):", metadata.name, ty));
        lines.push(format!("\t\tset_field(\"{}\", value)", metadata.name));
        lines.blank();
    }

    fn write_oneof_accessors(&self, lines: &mut Lines, oneof: &str) {
        lines.push(format!("\tfunc get_{oneof}():"));
        lines.push(format!("\t\treturn get_field(\"{oneof}\")"));
        lines.blank();
        lines.push(format!("\tfunc set_{oneof}(value):"));
        lines.push(format!("\t\tset_field(\"{oneof}\", value)"));
        lines.blank();
    }
}

/// Line-oriented output buffer for a generated script
#[derive(Debug, Default)]
struct Lines {
    buf: String,
}

impl Lines {
    fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, line: impl AsRef<str>) {
        self.buf.push_str(line.as_ref());
        self.buf.push('\n');
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn into_string(self) -> String {
        self.buf
    }
}
