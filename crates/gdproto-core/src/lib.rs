//! # gdproto-core
//!
//! A library for generating GDScript protobuf bindings from compiled schema
//! descriptors.
//!
//! This crate provides the core functionality for:
//! - Classifying schema wire kinds into the runtime's symbolic type tags
//! - Building per-field registration metadata (the field-descriptor mapping)
//! - Emitting one GDScript binding script per schema file
//! - protoc plugin request/response plumbing
//!
//! The generated scripts declare fields to a script-side runtime
//! (`proto.gd`) which performs the actual wire encoding and decoding; this
//! crate never touches wire bytes itself.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`gdscript`]: kind classification, field metadata, declaration emission
//! - [`plugin`]: `CodeGeneratorRequest` / `CodeGeneratorResponse` handling
//! - [`error`]: error types and handling
//!
//! ## Example
//!
//! ```
//! use gdproto_core::GdScriptGenerator;
//! use prost_reflect::DescriptorPool;
//! use prost_types::{DescriptorProto, FileDescriptorProto, FileDescriptorSet};
//!
//! let file = FileDescriptorProto {
//!     name: Some("player.proto".to_owned()),
//!     syntax: Some("proto3".to_owned()),
//!     message_type: vec![DescriptorProto {
//!         name: Some("Player".to_owned()),
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//! let pool = DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: vec![file] })?;
//! let file = pool.get_file_by_name("player.proto").unwrap();
//!
//! let script = GdScriptGenerator::new().generate(&file)?;
//! assert!(script.contains("class Player extends proto.ProtobufMessage:"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod error;
pub mod gdscript;
pub mod plugin;

// Re-export primary types for convenience
pub use error::{Error, Result};
pub use gdscript::{
    FieldMetadata, GdScriptGenerator, GeneratorConfig, TypeTag, RUNTIME_PRELOAD_PATH,
};
pub use plugin::{generate_response, GeneratedFile};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
