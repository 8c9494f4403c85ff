use std::fs;
use std::path::{Path, PathBuf};

use panvm_core::{IoContext, Os, Result};
use tracing::debug;

/// Executables some bundles nest under `bin/`. `pandoc-citeproc` only ships
/// with releases before 2.11.
const NESTED_BINARIES: [&str; 2] = ["pandoc", "pandoc-citeproc"];

/// Links `bin/<binary>` found anywhere below `install_dir` to the top level,
/// so every install exposes its binaries at a fixed depth.
pub(crate) fn link_nested_binaries(install_dir: &Path, os: Os) -> Result<Vec<PathBuf>> {
    let mut linked = Vec::new();
    for binary in NESTED_BINARIES {
        let file_name = match os {
            Os::Windows => format!("{binary}.exe"),
            Os::Linux | Os::MacOs => binary.to_string(),
        };
        let top_level = install_dir.join(&file_name);
        if fs::symlink_metadata(&top_level).is_ok() {
            continue;
        }

        let Some(nested) = find_in_bin_dir(install_dir, &file_name)? else {
            continue;
        };
        create_link(&nested, &top_level)?;
        debug!(
            link = %top_level.display(),
            target = %nested.display(),
            "linked nested binary"
        );
        linked.push(top_level);
    }
    Ok(linked)
}

fn find_in_bin_dir(dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .io_context(|| format!("failed to read {}", dir.display()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .io_context(|| format!("failed to read {}", dir.display()))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .io_context(|| format!("failed to stat {}", path.display()))?;
        if !file_type.is_dir() {
            continue;
        }
        if entry.file_name() == "bin" {
            let candidate = path.join(file_name);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }
        if let Some(found) = find_in_bin_dir(&path, file_name)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn create_link(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).io_context(|| {
            format!(
                "failed to create symlink {} -> {}",
                link.display(),
                target.display()
            )
        })
    }

    #[cfg(not(unix))]
    {
        fs::copy(target, link)
            .map(|_| ())
            .io_context(|| format!("failed to copy {} to {}", target.display(), link.display()))
    }
}

/// Sets the user-execute bit when it is missing. Returns whether the mode
/// changed; always `false` on hosts without Unix permissions.
pub(crate) fn repair_executable_bit(binary: &Path) -> Result<bool> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = fs::metadata(binary)
            .io_context(|| format!("failed to stat {}", binary.display()))?
            .permissions();
        let mode = permissions.mode();
        if mode & 0o100 != 0 {
            return Ok(false);
        }
        permissions.set_mode(mode | 0o100);
        fs::set_permissions(binary, permissions).io_context(|| {
            format!("failed to set executable mode on {}", binary.display())
        })?;
        debug!(binary = %binary.display(), "restored missing execute bit");
        Ok(true)
    }

    #[cfg(not(unix))]
    {
        let _ = binary;
        Ok(false)
    }
}
