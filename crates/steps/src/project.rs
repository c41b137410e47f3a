//! Assemble a [`ProgramRegistry`] from in-memory sources.
//!
//! Paths follow the on-disk project layout: the building file at the root,
//! each floor in its own folder as `<floor>/<floor>.floor`, and step files
//! next to it as `<floor>/<step>.step`.

use steps_eval::{ProgramRegistry, RegistryBuilder};
use steps_types::ast::{FileKind, Program};
use steps_types::{Diagnostics, SourceFile, StepsError};

/// Why a set of sources could not be turned into a program.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("'{0}' is not a .building, .floor or .step file")]
    UnknownFileKind(String),

    #[error("'{0}' must live inside a floor folder")]
    MissingFolder(String),

    #[error("{} error(s) in '{file}'", .errors.total_errors)]
    Parse { file: String, errors: Diagnostics },

    #[error("{} project error(s)", .0.len())]
    Registry(Vec<StepsError>),
}

impl LoadError {
    /// The structured diagnostics behind this error, if any.
    pub fn diagnostics(&self) -> Vec<&StepsError> {
        match self {
            LoadError::Parse { errors, .. } => errors.errors.iter().collect(),
            LoadError::Registry(errors) => errors.iter().collect(),
            LoadError::UnknownFileKind(_) | LoadError::MissingFolder(_) => Vec::new(),
        }
    }
}

/// File kind implied by a path's extension.
pub fn file_kind(path: &str) -> Option<FileKind> {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("building") => Some(FileKind::Building),
        Some("floor") => Some(FileKind::Floor),
        Some("step") => Some(FileKind::Step),
        _ => None,
    }
}

/// Folder a floor or step file sits in: the last directory of its path.
fn folder_of(path: &str) -> Option<&str> {
    let (dirs, _) = path.rsplit_once('/')?;
    Some(dirs.rsplit('/').next().unwrap_or(dirs))
}

/// Parse every file and validate the result as one program.
///
/// Parsing stops at the first file with errors; registry rules are then
/// checked together and reported as a batch.
pub fn load<'a, F>(files: F) -> Result<ProgramRegistry, LoadError>
where
    F: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut builder = RegistryBuilder::default();
    for (path, text) in files {
        let kind = file_kind(path).ok_or_else(|| LoadError::UnknownFileKind(path.to_string()))?;
        let source = SourceFile::new(path, text);
        let result = steps_parser::parse_source(&source, kind);
        if result.errors.has_errors() {
            return Err(LoadError::Parse {
                file: path.to_string(),
                errors: result.errors,
            });
        }
        let Some(program) = result.program else {
            return Err(LoadError::Parse {
                file: path.to_string(),
                errors: result.errors,
            });
        };
        builder = match program {
            Program::Building(def) => builder.building(def, source),
            Program::Floor(def) => {
                let folder = folder_of(path).ok_or_else(|| LoadError::MissingFolder(path.to_string()))?;
                builder.floor(folder, def, source)
            }
            Program::Step(def) => {
                let folder = folder_of(path).ok_or_else(|| LoadError::MissingFolder(path.to_string()))?;
                builder.step(folder, def, source)
            }
        };
    }
    builder.build().map_err(LoadError::Registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(file_kind("app.building"), Some(FileKind::Building));
        assert_eq!(file_kind("math/math.floor"), Some(FileKind::Floor));
        assert_eq!(file_kind("math/double.step"), Some(FileKind::Step));
        assert_eq!(file_kind("notes.txt"), None);
    }

    #[test]
    fn test_folder_is_last_directory() {
        assert_eq!(folder_of("math/double.step"), Some("math"));
        assert_eq!(folder_of("project/math/double.step"), Some("math"));
        assert_eq!(folder_of("double.step"), None);
    }
}
