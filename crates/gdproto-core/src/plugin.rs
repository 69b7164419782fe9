//! protoc plugin plumbing.
//!
//! Decodes a [`CodeGeneratorRequest`], resolves the descriptor set it
//! carries, runs the generator over every file the compiler marked for
//! generation and packages the results as a [`CodeGeneratorResponse`].
//! Generation failures are reported through the response's `error` field,
//! per protoc plugin convention.

use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::compiler::{code_generator_response, CodeGeneratorRequest, CodeGeneratorResponse};
use prost_types::FileDescriptorSet;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::gdscript::{GdScriptGenerator, GeneratorConfig};

/// Suffix substituted for a schema file's `.proto` extension
pub const GENERATED_SUFFIX: &str = "_pb.gd";

/// One generated artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Output path, derived from the schema path
    pub name: String,
    /// Generated GDScript source
    pub content: String,
}

/// Decodes a serialized [`CodeGeneratorRequest`]
pub fn decode_request(data: &[u8]) -> Result<CodeGeneratorRequest> {
    Ok(CodeGeneratorRequest::decode(data)?)
}

/// Maps a schema path to its generated script path
pub fn output_filename(proto_name: &str) -> String {
    let stem = proto_name.strip_suffix(".proto").unwrap_or(proto_name);
    format!("{stem}{GENERATED_SUFFIX}")
}

/// Runs the generator over every file the request marks for generation.
///
/// The request's `proto_file` set must be self-contained (protoc always sends
/// the transitive dependency closure).
pub fn generate_files(request: &CodeGeneratorRequest) -> Result<Vec<GeneratedFile>> {
    let config = parse_parameter(request.parameter())?;
    let pool = DescriptorPool::from_file_descriptor_set(FileDescriptorSet {
        file: request.proto_file.clone(),
    })?;
    let generator = GdScriptGenerator::with_config(config);

    let mut files = Vec::with_capacity(request.file_to_generate.len());
    for name in &request.file_to_generate {
        let file = pool
            .get_file_by_name(name)
            .ok_or_else(|| Error::file_not_found(name))?;
        debug!("generating {}", name);
        files.push(GeneratedFile {
            name: output_filename(name),
            content: generator.generate(&file)?,
        });
    }
    Ok(files)
}

/// Handles a request end to end.
///
/// Failures are packaged into the response's `error` field so the compiler
/// reports them instead of receiving a half-written response.
pub fn generate_response(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    let mut response = CodeGeneratorResponse {
        supported_features: Some(code_generator_response::Feature::Proto3Optional as u64),
        ..Default::default()
    };

    match generate_files(request) {
        Ok(files) => {
            response.file = files
                .into_iter()
                .map(|file| code_generator_response::File {
                    name: Some(file.name),
                    content: Some(file.content),
                    ..Default::default()
                })
                .collect();
        }
        Err(err) => {
            warn!("generation failed: {}", err);
            response.error = Some(err.to_string());
        }
    }

    response
}

/// Parses the compiler's parameter string (`--godot_opt=...`).
///
/// Supported options: `runtime=<res path>` and `no-comments`. Unknown options
/// are an error so typos surface instead of being ignored.
fn parse_parameter(parameter: &str) -> Result<GeneratorConfig> {
    let mut config = GeneratorConfig::new();
    for option in parameter.split(',').map(str::trim).filter(|o| !o.is_empty()) {
        match option.split_once('=') {
            Some(("runtime", path)) => config = config.runtime_preload(path),
            None if option == "no-comments" => config = config.include_comments(false),
            _ => return Err(Error::invalid_parameter(option)),
        }
    }
    Ok(config)
}
