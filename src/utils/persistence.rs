use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

const TMP_SUFFIX: &str = "tmp";

/// Replaces the file at `path` with `data` by staging to a sibling temporary file and
/// renaming it, so readers never observe a half-written file.
pub fn replace_file(path: &Path, data: &str) -> std::io::Result<()> {
    let tmp = tmp_path(path);
    write_synced(&tmp, data)?;
    fs::rename(&tmp, path)
}

/// `ledger.json` stages to `ledger.json.tmp`.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_synced(path: &Path, data: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()
}
