use anyhow::{Result, Context, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::subtitle_processor::SubtitleFormat;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for a processed subtitle, keeping the input file name
    // @params: input_file, output_dir
    pub fn output_path<P1: AsRef<Path>, P2: AsRef<Path>>(input_file: P1, output_dir: P2) -> Result<PathBuf> {
        let input_file = input_file.as_ref();
        let file_name = input_file
            .file_name()
            .ok_or_else(|| anyhow!("Input path has no file name: {:?}", input_file))?;
        Ok(output_dir.as_ref().join(file_name))
    }

    // @generates: Output path mirroring the input's location below `input_dir`
    // @params: input_file, input_dir, output_dir
    pub fn mirrored_output_path<P1, P2, P3>(input_file: P1, input_dir: P2, output_dir: P3) -> Result<PathBuf>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        P3: AsRef<Path>,
    {
        let input_file = input_file.as_ref();
        match input_file.strip_prefix(input_dir.as_ref()) {
            Ok(relative) if relative.file_name().is_some() => Ok(output_dir.as_ref().join(relative)),
            _ => Self::output_path(input_file, output_dir),
        }
    }

    /// Find SRT and ASS files in a directory, sorted by path
    pub fn find_subtitle_files<P: AsRef<Path>>(dir: P, recursive: bool) -> Result<Vec<PathBuf>> {
        Self::find_subtitle_files_excluding(dir, recursive, None::<&Path>)
    }

    /// Find SRT and ASS files in a directory, never descending into `exclude`
    pub fn find_subtitle_files_excluding<P1: AsRef<Path>, P2: AsRef<Path>>(
        dir: P1,
        recursive: bool,
        exclude: Option<P2>,
    ) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        if !Self::dir_exists(dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", dir));
        }

        // A missing directory cannot contain anything to skip
        let excluded = exclude.and_then(|path| fs::canonicalize(path.as_ref()).ok());

        let walker = WalkDir::new(dir).follow_links(true);
        let walker = if recursive { walker } else { walker.max_depth(1) };
        let walker = walker.into_iter().filter_entry(|entry| {
            match &excluded {
                Some(excluded) if entry.depth() > 0 && entry.file_type().is_dir() => {
                    fs::canonicalize(entry.path()).map(|p| p != *excluded).unwrap_or(true)
                }
                _ => true,
            }
        });

        let mut result = Vec::new();
        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && SubtitleFormat::is_supported(path) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Copy a file from one location to another, ensuring the target directory exists
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow!("Source file does not exist: {:?}", from));
        }

        // Ensure the target directory exists
        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        fs::copy(from, to)
            .with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;

        Ok(())
    }
}
