//! Filesystem infrastructure: implements `ArtifactStore`.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stackweave_common::Manifest;
use stackweave_common::manifest::MANIFEST_FILE;

use crate::application::ports::ArtifactStore;
use crate::domain::synth::StackTemplate;

const TEMPLATE_SUFFIX: &str = ".template.json";

/// Writes templates and the manifest into one output directory.
///
/// Each file is written to a temporary sibling and renamed into place, so a
/// reader never sees a half-written template. Templates left over from a
/// previous run that are no longer part of the manifest are removed.
pub struct FsArtifactStore {
    out_dir: PathBuf,
}

impl FsArtifactStore {
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn write_stacks(&self, stacks: &[StackTemplate], manifest: &Manifest) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("creating output dir {}", self.out_dir.display()))?;

        let mut written = BTreeSet::new();
        for stack in stacks {
            let file = stack.file_name();
            write_atomic(&self.out_dir, &file, stack.render()?.as_bytes())?;
            written.insert(file);
        }

        let mut body = serde_json::to_string_pretty(manifest).context("serializing manifest")?;
        body.push('\n');
        write_atomic(&self.out_dir, MANIFEST_FILE, body.as_bytes())?;

        remove_stale(&self.out_dir, &written)?;
        Ok(self.out_dir.clone())
    }

    fn template_path(&self, stack: &StackTemplate) -> PathBuf {
        self.out_dir.join(stack.file_name())
    }
}

fn write_atomic(dir: &Path, name: &str, content: &[u8]) -> Result<()> {
    let target = dir.join(name);
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(content)
        .with_context(|| format!("writing {}", target.display()))?;
    tmp.persist(&target)
        .with_context(|| format!("renaming into {}", target.display()))?;
    tracing::debug!(path = %target.display(), "artifact written");
    Ok(())
}

fn remove_stale(dir: &Path, keep: &BTreeSet<String>) -> Result<()> {
    let entries = std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(TEMPLATE_SUFFIX) && !keep.contains(&name) {
            std::fs::remove_file(entry.path())
                .with_context(|| format!("removing stale {}", entry.path().display()))?;
            tracing::debug!(file = %name, "removed stale template");
        }
    }
    Ok(())
}
