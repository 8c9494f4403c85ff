use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use panvm_core::{ArchiveType, Error, IoContext, Result};
use tracing::debug;

pub trait Extractor {
    /// Unpacks `archive` into `destination`, keeping the archive's own layout.
    fn extract(&self, archive: &Path, destination: &Path, archive_type: ArchiveType) -> Result<()>;
}

/// Extracts with the host's `tar`, `unzip`, or PowerShell.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandExtractor;

impl Extractor for CommandExtractor {
    fn extract(&self, archive: &Path, destination: &Path, archive_type: ArchiveType) -> Result<()> {
        fs::create_dir_all(destination)
            .io_context(|| format!("failed to create {}", destination.display()))?;
        debug!(
            archive = %archive.display(),
            destination = %destination.display(),
            kind = archive_type.as_str(),
            "extracting"
        );

        let result = match archive_type {
            ArchiveType::TarGz => extract_tar(archive, destination),
            ArchiveType::Zip => extract_zip(archive, destination),
        };
        result.map_err(|err| Error::ExtractionFailure {
            archive: archive.to_path_buf(),
            message: err.to_string(),
        })
    }
}

fn extract_tar(archive: &Path, destination: &Path) -> Result<()> {
    run_command(
        Command::new("tar")
            .arg("-xf")
            .arg(archive)
            .arg("-C")
            .arg(destination),
        "failed to extract tar archive",
    )
}

fn extract_zip(archive: &Path, destination: &Path) -> Result<()> {
    if cfg!(windows) {
        let mut command = Command::new("powershell");
        command.arg("-NoProfile").arg("-Command").arg(format!(
            "Expand-Archive -LiteralPath '{}' -DestinationPath '{}' -Force",
            escape_ps_single_quote(archive),
            escape_ps_single_quote(destination)
        ));
        if run_command(&mut command, "failed to extract zip archive with powershell").is_ok() {
            return Ok(());
        }
    }

    let mut unzip_command = Command::new("unzip");
    unzip_command
        .arg("-q")
        .arg("-o")
        .arg(archive)
        .arg("-d")
        .arg(destination);
    if run_command(&mut unzip_command, "failed to extract zip archive with unzip").is_ok() {
        return Ok(());
    }

    run_command(
        Command::new("tar")
            .arg("-xf")
            .arg(archive)
            .arg("-C")
            .arg(destination),
        "failed to extract zip archive with tar fallback",
    )
}

fn run_command(command: &mut Command, context_message: &str) -> Result<()> {
    let output = command
        .output()
        .io_context(|| format!("{context_message}: command failed to start"))?;
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    Err(Error::Command {
        context: context_message.to_string(),
        message: format!(
            "status={} stdout='{}' stderr='{}'",
            output.status,
            stdout.trim(),
            stderr.trim()
        ),
    })
}

fn escape_ps_single_quote(path: &Path) -> String {
    let mut os = OsString::new();
    os.push(path.as_os_str());
    os.to_string_lossy().replace('\'', "''")
}

/// Moves every regular file below `src` directly into `dst`, discarding the
/// directory structure. Later files win on name clashes.
pub(crate) fn flatten_into(src: &Path, dst: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dst).io_context(|| format!("failed to create {}", dst.display()))?;
    let mut placed = Vec::new();
    flatten_recursive(src, dst, &mut placed)?;
    Ok(placed)
}

fn flatten_recursive(current: &Path, dst: &Path, placed: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(current)
        .io_context(|| format!("failed to read {}", current.display()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .io_context(|| format!("failed to read {}", current.display()))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let metadata = fs::metadata(&path)
            .io_context(|| format!("failed to stat {}", path.display()))?;
        if metadata.is_dir() {
            flatten_recursive(&path, dst, placed)?;
            continue;
        }

        let target = dst.join(entry.file_name());
        fs::copy(&path, &target).io_context(|| {
            format!("failed to copy {} to {}", path.display(), target.display())
        })?;
        if !placed.contains(&target) {
            placed.push(target);
        }
    }
    Ok(())
}
