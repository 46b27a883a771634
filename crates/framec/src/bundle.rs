/// Script bundle: compiled scripts on disk plus an optional JSON manifest.
///
/// Layout:
/// <out>/<context>/<script>.<ext>   one file per script, so `invoke context/script`
///                                  maps directly onto a relative path
/// <out>/manifest.json              units, their scripts and warnings

use crate::compiler::Compilation;
use crate::diagnostics::Diagnostic;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
const FORMAT: &str = "frame-commands-v1";

#[derive(Debug, Serialize)]
pub struct UnitEntry {
    pub context: String,
    pub source: String,
    pub scripts: Vec<String>,
    pub warnings: Vec<Diagnostic>,
}

impl UnitEntry {
    pub fn new(source: &Path, compilation: &Compilation) -> Self {
        Self {
            context: compilation.context.clone(),
            source: source.display().to_string(),
            scripts: compilation.scripts.keys().cloned().collect(),
            warnings: compilation.warnings.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Manifest {
    pub version: String,
    pub format: &'static str,
    pub units: Vec<UnitEntry>,
}

impl Manifest {
    pub fn new(units: Vec<UnitEntry>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: FORMAT,
            units,
        }
    }
}

/// Write every script of `compilation` under `<out_dir>/<context>/`.
pub fn write_scripts(out_dir: &Path, compilation: &Compilation, extension: &str) -> io::Result<Vec<PathBuf>> {
    let dir = out_dir.join(&compilation.context);
    fs::create_dir_all(&dir)?;

    let mut written = Vec::with_capacity(compilation.scripts.len());
    for (name, body) in &compilation.scripts {
        let path = dir.join(name).with_extension(extension);
        fs::write(&path, body)?;
        log::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

pub fn write_manifest<W: Write>(writer: &mut W, manifest: &Manifest) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(manifest)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writer.write_all(&bytes)?;
    writer.write_all(b"\n")?;
    Ok(())
}
