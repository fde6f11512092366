use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::ResultSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One `[OPEN] ...` line per result.
    #[default]
    Lines,
    /// Pretty JSON array of the same lines.
    Json,
}

/// Persist the report lines of `results` to `path`.
///
/// Failure leaves `results` untouched; callers report it and move on.
pub fn write_results(path: &Path, results: &ResultSet, format: OutputFormat) -> Result<()> {
    write_to_file(path, results, format).map_err(|source| Error::Output {
        path: path.to_path_buf(),
        source,
    })
}

fn write_to_file(path: &Path, results: &ResultSet, format: OutputFormat) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    let lines = results.report_lines();
    match format {
        OutputFormat::Lines => {
            for line in &lines {
                writeln!(out, "{line}")?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &lines)?;
            writeln!(out)?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProbeOutcome, ScanTarget};

    fn sample() -> ResultSet {
        let mk = |port: u16, service: &str, banner: &str| ProbeOutcome {
            target: ScanTarget::new("192.168.0.10", port),
            open: true,
            service: service.into(),
            banner: banner.into(),
            latency_ms: 1,
            timestamp: "2024-01-01T00:00:00Z".into(),
        };
        ResultSet {
            probed: 100,
            entries: vec![mk(22, "SSH", "SSH-2.0-OpenSSH_9.6"), mk(80, "HTTP", "")],
        }
    }

    #[test]
    fn writes_plain_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_results(&path, &sample(), OutputFormat::Lines).unwrap();
        let body = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            body,
            "[OPEN] 192.168.0.10:22 (SSH) → SSH-2.0-OpenSSH_9.6\n[OPEN] 192.168.0.10:80 (HTTP)\n"
        );
    }

    #[test]
    fn writes_json_array_of_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_results(&path, &sample(), OutputFormat::Json).unwrap();
        let parsed: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, sample().report_lines());
    }

    #[test]
    fn empty_results_give_empty_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        write_results(&path, &ResultSet::default(), OutputFormat::Json).unwrap();
        let parsed: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn unwritable_path_reports_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        let results = sample();
        let err = write_results(&path, &results, OutputFormat::Lines).unwrap_err();
        assert!(matches!(err, Error::Output { .. }));
        assert_eq!(results.len(), 2);
    }
}
