//! Content digest of an image build directory.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::application::ports::DirectoryDigester;

/// SHA-256 over the contents of a build directory.
///
/// Entries are visited in file-name order and each contributes its
/// `/`-separated relative path, a kind marker and its payload: the bytes of a
/// regular file, or the target of a symlink. Links are not followed; their
/// targets inside the directory are hashed as entries of their own.
pub struct Sha256Digester;

const FILE: u8 = b'f';
const LINK: u8 = b'l';

impl DirectoryDigester for Sha256Digester {
    fn digest_dir(&self, dir: &Path) -> Result<String> {
        if !dir.is_dir() {
            anyhow::bail!("{} is not a directory", dir.display());
        }
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; 65536];
        for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
            let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
            let path = entry.path();
            let kind = entry.file_type();
            if !kind.is_file() && !kind.is_symlink() {
                continue;
            }
            let rel = path
                .strip_prefix(dir)
                .unwrap_or(path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            hasher.update(rel.as_bytes());
            hasher.update([0u8]);

            if kind.is_symlink() {
                let target = std::fs::read_link(path)
                    .with_context(|| format!("reading link {}", path.display()))?;
                hasher.update([LINK]);
                hasher.update(target.to_string_lossy().as_bytes());
            } else {
                let mut file = std::fs::File::open(path)
                    .with_context(|| format!("opening {}", path.display()))?;
                hasher.update([FILE]);
                loop {
                    let n = file
                        .read(&mut buf)
                        .with_context(|| format!("reading {}", path.display()))?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
            }
            hasher.update([0u8]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}
