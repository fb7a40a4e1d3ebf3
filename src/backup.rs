use crate::store::StateSnapshot;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const STATE_ENTRY: &str = "state/collections.json";
pub const BUNDLE_FORMAT: &str = "gradebook-state-v1";
const BUNDLE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub format: String,
    pub version: u32,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub exported_at: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub sha256: String,
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn export_state_bundle(snapshot: &StateSnapshot, out_path: &Path) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let state = serde_json::to_vec_pretty(snapshot).context("failed to serialize state")?;
    let manifest = Manifest {
        format: BUNDLE_FORMAT.to_string(),
        version: BUNDLE_VERSION,
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        exported_at: chrono::Utc::now().to_rfc3339(),
        sha256: sha256_hex(&state),
    };

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(STATE_ENTRY, opts)
        .context("failed to start state entry")?;
    zip.write_all(&state).context("failed to write state entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT.to_string(),
        entry_count: 2,
        sha256: manifest.sha256,
    })
}

/// Reads and verifies a bundle. Nothing is written; the caller decides
/// whether to apply the snapshot.
pub fn read_state_bundle(in_path: &Path) -> anyhow::Result<(Manifest, StateSnapshot)> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: Manifest =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid")?;
    if manifest.format != BUNDLE_FORMAT {
        return Err(anyhow!("unsupported bundle format: {}", manifest.format));
    }

    let mut state = Vec::new();
    archive
        .by_name(STATE_ENTRY)
        .context("bundle missing state/collections.json")?
        .read_to_end(&mut state)
        .context("failed to read state entry")?;
    let actual = sha256_hex(&state);
    if !actual.eq_ignore_ascii_case(&manifest.sha256) {
        return Err(anyhow!(
            "checksum mismatch: manifest says {}, state entry hashes to {}",
            manifest.sha256,
            actual
        ));
    }

    let snapshot: StateSnapshot =
        serde_json::from_slice(&state).context("state/collections.json is invalid")?;
    Ok((manifest, snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{assignment, rubric, student};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    fn sample() -> StateSnapshot {
        let mut snap = StateSnapshot::default();
        snap.students.push(student("s1", "Ada"));
        snap.saved_rubrics.push(rubric("r1", 2, 4));
        snap.assignments.push(assignment("a1", "r1", "2024-09-10"));
        snap.grades.set("a1", "s1", 1, Some(3));
        snap.schedule_config.holidays.push("2024-10-14".to_string());
        snap
    }

    #[test]
    fn bundle_roundtrip_restores_every_collection() {
        let dir = temp_dir("gradebook-bundle");
        let path = dir.join("out").join("state.zip");
        let snap = sample();

        let summary = export_state_bundle(&snap, &path).expect("export");
        assert_eq!(summary.entry_count, 2);
        assert_eq!(summary.sha256.len(), 64);

        let (manifest, back) = read_state_bundle(&path).expect("read");
        assert_eq!(manifest.format, BUNDLE_FORMAT);
        assert_eq!(manifest.sha256, summary.sha256);
        assert_eq!(back, snap);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn tampered_state_is_rejected() {
        let dir = temp_dir("gradebook-bundle-tamper");
        let path = dir.join("tampered.zip");
        let manifest = Manifest {
            format: BUNDLE_FORMAT.to_string(),
            version: 1,
            app_version: String::new(),
            exported_at: String::new(),
            sha256: sha256_hex(b"{}"),
        };
        let mut zip = ZipWriter::new(File::create(&path).expect("create"));
        let opts = FileOptions::default();
        zip.start_file(MANIFEST_ENTRY, opts).expect("manifest");
        zip.write_all(serde_json::to_string(&manifest).expect("json").as_bytes())
            .expect("write manifest");
        zip.start_file(STATE_ENTRY, opts).expect("state");
        zip.write_all(br#"{"students":[]}"#).expect("write state");
        zip.finish().expect("finish");

        let err = read_state_bundle(&path).expect_err("checksum");
        assert!(err.to_string().contains("checksum mismatch"));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn non_zip_input_is_an_error() {
        let dir = temp_dir("gradebook-bundle-bad");
        let path = dir.join("plain.txt");
        std::fs::write(&path, b"not a zip").expect("write");
        assert!(read_state_bundle(&path).is_err());
        let _ = std::fs::remove_dir_all(dir);
    }
}
