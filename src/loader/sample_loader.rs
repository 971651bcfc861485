use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::audio::SampleBuffer;

// WAV files directly inside `dir`, sorted by name so pad order is stable.
pub fn index_wav_in_dir(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_wav(p))
        .collect();
    paths.sort();
    Ok(paths)
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

// Load a WAV from disk, ready to hand to the engine
pub fn load(path: &Path, target_rate: u32) -> anyhow::Result<SampleBuffer> {
    SampleBuffer::load_wav(path, target_rate)
}
