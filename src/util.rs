use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn ensure_file_exists(path: &Path, label: &str) -> Result<()> {
    if !path.is_file() {
        bail!("{label} not found: {}", path.display());
    }
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path, label: &str) -> Result<T> {
    ensure_file_exists(path, label)?;
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {label} json: {}", path.display()))
}

/// Pretty-printed UTF-8 JSON; non-ASCII characters are written as-is.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

pub fn write_json_stdout<T: Serialize>(value: &T) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, value).context("failed to serialize json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        text: String,
    }

    #[test]
    fn write_json_pretty_preserves_non_ascii() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out").join("sample.json");
        let sample = Sample {
            text: "cobertura não encontrada".to_string(),
        };

        write_json_pretty(&path, &sample).expect("json writes");
        let raw = fs::read_to_string(&path).expect("json reads back");
        assert!(raw.contains("cobertura não encontrada"));
        assert_eq!(read_json::<Sample>(&path, "sample").expect("json parses"), sample);
    }

    #[test]
    fn read_json_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("missing.json");
        let error = read_json::<Sample>(&missing, "chunks file").expect_err("missing file fails");
        assert!(error.to_string().contains("chunks file not found"));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "[{").expect("fixture writes");
        let error = read_json::<Sample>(&broken, "chunks file").expect_err("bad json fails");
        assert!(error.to_string().contains("failed to parse chunks file json"));
    }
}
