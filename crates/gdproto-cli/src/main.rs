//! protoc-gen-godot - generate GDScript protobuf bindings
//!
//! Run as a protoc plugin (`protoc --godot_out=addons/ game.proto`), reading
//! a serialized code generator request on stdin and writing the response on
//! stdout; or standalone against an encoded `FileDescriptorSet` produced
//! with `protoc --descriptor_set_out`.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use gdproto_core::plugin;
use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;
use prost_types::FileDescriptorSet;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

/// Generate GDScript protobuf bindings
#[derive(Parser, Debug)]
#[command(name = "protoc-gen-godot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Read an encoded FileDescriptorSet from PATH instead of acting as a protoc plugin
    #[arg(short = 'd', long, value_name = "PATH")]
    descriptor_set: Option<PathBuf>,

    /// Output directory for generated scripts (descriptor-set mode)
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Restrict generation to the named schema files (descriptor-set mode)
    #[arg(short, long, value_name = "PROTO")]
    file: Vec<String>,

    /// Generator options, as protoc would pass them (e.g. "runtime=res://proto.gd")
    #[arg(short, long)]
    parameter: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // Diagnostics go to stderr: in plugin mode stdout carries the serialized
    // response.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match cli.descriptor_set {
        Some(ref path) => run_descriptor_set(&cli, path),
        None => run_plugin(),
    }
}

/// Standard protoc plugin loop: request on stdin, response on stdout
fn run_plugin() -> Result<()> {
    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .context("Failed to read code generator request from stdin")?;

    let request =
        plugin::decode_request(&input).context("Failed to decode code generator request")?;
    debug!(
        "Received request for {} file(s)",
        request.file_to_generate.len()
    );

    let response = plugin::generate_response(&request);
    io::stdout()
        .write_all(&response.encode_to_vec())
        .context("Failed to write code generator response to stdout")?;

    Ok(())
}

/// Generate from an encoded FileDescriptorSet and write scripts to disk
fn run_descriptor_set(cli: &Cli, path: &Path) -> Result<()> {
    let data = fs::read(path)
        .with_context(|| format!("Failed to read descriptor set: {}", path.display()))?;
    let set = FileDescriptorSet::decode(data.as_slice())
        .with_context(|| format!("Failed to decode descriptor set: {}", path.display()))?;

    if set.file.is_empty() {
        bail!("Descriptor set contains no schema files: {}", path.display());
    }

    let file_to_generate = if cli.file.is_empty() {
        set.file.iter().map(|file| file.name().to_owned()).collect()
    } else {
        cli.file.clone()
    };

    let request = CodeGeneratorRequest {
        file_to_generate,
        parameter: cli.parameter.clone(),
        proto_file: set.file,
        ..Default::default()
    };

    let files = plugin::generate_files(&request)?;
    for file in &files {
        let output_path = cli.output.join(&file.name);
        write_script_file(&output_path, &file.content)?;
        info!("Wrote {}", output_path.display());
    }

    debug!("Generated {} file(s)", files.len());
    Ok(())
}

/// Write a generated script, creating parent directories as needed
fn write_script_file(output_path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(output_path, content)
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;

    Ok(())
}
