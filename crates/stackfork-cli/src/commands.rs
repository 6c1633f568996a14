//! Subcommand implementations
//!
//! File handling around the renaming engine. Nothing here prints; the binary
//! decides where text goes.

use std::path::{Path, PathBuf};

use stackfork_model::{ComposeDocument, ModelError, ResourceKind};
use stackfork_rename::{
    randomize_deployable, Deployable, DeployableOptions, RenameOptions, Renamer, Suffix,
};

use crate::config::OutputFormat;

/// File name of the compose document written by `randomize`
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";

/// File name of the env file written by `randomize`
pub const ENV_FILE_NAME: &str = ".env";

/// Subcommand failures
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Reading or writing a file failed
    #[error("{action} {}: {source}", path.display())]
    Io {
        /// What was being done
        action: &'static str,
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Document could not be parsed or rendered
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl CommandError {
    fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(std::io::Error) -> Self + 'a {
        move |source| Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Parsed arguments of `rename`
#[derive(Debug, Clone)]
pub struct RenameRequest {
    /// Suffix to apply
    pub suffix: Suffix,
    /// Rename only this kind of resource
    pub kind: Option<ResourceKind>,
    /// Renaming options
    pub options: RenameOptions,
    /// Output text format
    pub format: OutputFormat,
}

/// Read a compose file
///
/// `.json` files are parsed as JSON, everything else as YAML.
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn read_document(path: &Path) -> Result<ComposeDocument, CommandError> {
    let text = std::fs::read_to_string(path).map_err(CommandError::io("failed to read", path))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let doc = if is_json {
        ComposeDocument::from_json(&text)?
    } else {
        ComposeDocument::from_yaml(&text)?
    };
    tracing::debug!(
        "Loaded {} ({} services)",
        path.display(),
        doc.service_names().len()
    );
    Ok(doc)
}

/// Render a document in `format`
///
/// # Errors
/// Returns error if serialization fails
pub fn render(doc: &ComposeDocument, format: OutputFormat) -> Result<String, ModelError> {
    match format {
        OutputFormat::Yaml => doc.to_yaml(),
        OutputFormat::Json => doc.to_json().map(|mut json| {
            json.push('\n');
            json
        }),
    }
}

/// Rename the document at `input` and render the result
///
/// # Errors
/// Returns error if the input cannot be read or the output rendered
pub fn rename_file(input: &Path, request: &RenameRequest) -> Result<String, CommandError> {
    let doc = read_document(input)?;
    let renamer = Renamer::new(request.options.clone());
    let out = match request.kind {
        Some(kind) => renamer.rename_one_kind(&doc, kind, &request.suffix),
        None => renamer.rename_all(&doc, &request.suffix),
    };
    Ok(render(&out, request.format)?)
}

/// Write `text` to `path`, creating parent directories
///
/// # Errors
/// Returns error if a directory or the file cannot be written
pub fn write_file(path: &Path, text: &str) -> Result<(), CommandError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(CommandError::io("failed to create", parent))?;
    }
    std::fs::write(path, text).map_err(CommandError::io("failed to write", path))
}

/// Produce a deployable instance of `input` in `out_dir`
///
/// Writes [`COMPOSE_FILE_NAME`] and [`ENV_FILE_NAME`]. The env file starts
/// from `env_file` when given, empty otherwise.
///
/// # Errors
/// Returns error if any file cannot be read, rendered or written
pub fn randomize_into(
    input: &Path,
    env_file: Option<&Path>,
    out_dir: &Path,
    suffix: &Suffix,
    options: &DeployableOptions,
) -> Result<Deployable, CommandError> {
    let doc = read_document(input)?;
    let env = match env_file {
        Some(path) => {
            std::fs::read_to_string(path).map_err(CommandError::io("failed to read", path))?
        }
        None => String::new(),
    };

    let deployable = randomize_deployable(&doc, suffix, &env, options);

    write_file(
        &out_dir.join(COMPOSE_FILE_NAME),
        &render(&deployable.document, OutputFormat::Yaml)?,
    )?;
    write_file(&out_dir.join(ENV_FILE_NAME), &deployable.env)?;
    tracing::info!("Wrote deployable to {}", out_dir.display());

    Ok(deployable)
}
