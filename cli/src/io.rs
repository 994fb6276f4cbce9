use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use imagepost_core::format::OutputFormat;
use imagepost_core::ProcessingError;

/// Collect all supported image files from the input path.
/// If `recursive` is true, walk subdirectories.
pub fn collect_files(input: &Path, recursive: bool) -> Result<Vec<PathBuf>, ProcessingError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    if !input.is_dir() {
        return Err(ProcessingError::ReadFile {
            path: input.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a file or directory"),
        });
    }

    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    return Some(Err(ProcessingError::ReadFile {
                        path,
                        source: e.into(),
                    }));
                }
            };
            if !entry.file_type().is_file() {
                return None;
            }
            let path = entry.into_path();
            if OutputFormat::from_path(&path).is_some() && !is_rendered_output(&path) {
                Some(Ok(path))
            } else {
                None
            }
        })
        .collect::<Result<_, _>>()?;

    files.sort();
    Ok(files)
}

/// Files written by a previous in-place render are not inputs.
fn is_rendered_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.ends_with(".processed"))
}

/// Resolve the output path for a given input file, using the extension of
/// the format it will be encoded in.
/// If `output_base` is None, write `<stem>.processed.<ext>` next to the input.
/// If `output_base` is a directory, mirror the relative structure.
pub fn resolve_output(
    input_file: &Path,
    input_base: &Path,
    output_base: Option<&Path>,
    format: OutputFormat,
) -> PathBuf {
    let stem = input_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".into());

    match output_base {
        None => input_file.with_file_name(format!("{}.processed.{}", stem, format.extension())),
        Some(out) => {
            if input_base.is_file() {
                // Single file → single output
                if out.extension().is_some() {
                    out.with_extension(format.extension())
                } else {
                    out.join(format!("{}.{}", stem, format.extension()))
                }
            } else {
                // Directory → mirror structure
                let relative = input_file.strip_prefix(input_base).unwrap_or(input_file);
                out.join(relative).with_extension(format.extension())
            }
        }
    }
}

/// Read file contents.
pub fn read_file(path: &Path) -> Result<Vec<u8>, ProcessingError> {
    fs::read(path).map_err(|e| ProcessingError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write file contents, creating parent directories as needed.
pub fn write_file(path: &Path, data: &[u8]) -> Result<(), ProcessingError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ProcessingError::WriteFile {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, data).map_err(|e| ProcessingError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}
