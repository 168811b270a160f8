//! Target resolution from a single override or a CSV table

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::context::VerificationTarget;
use crate::error::{VerifyError, VerifyResult};

/// Where the deployments to verify come from
#[derive(Debug, Clone)]
pub enum TargetSource {
    /// One domain, bypassing the table (`DOMAIN`)
    Override(String),
    /// CSV file whose header names a `domain` column
    Table(PathBuf),
}

impl TargetSource {
    pub fn new(domain_override: Option<String>, table: PathBuf) -> Self {
        match domain_override.filter(|d| !d.trim().is_empty()) {
            Some(domain) => TargetSource::Override(domain),
            None => TargetSource::Table(table),
        }
    }

    /// Resolve the targets. The table is read on every call.
    pub fn resolve(&self) -> VerifyResult<Vec<VerificationTarget>> {
        match self {
            TargetSource::Override(domain) => Ok(vec![VerificationTarget::from_domain(domain)]),
            TargetSource::Table(path) => {
                let file = File::open(path).map_err(|e| {
                    VerifyError::Configuration(format!(
                        "cannot read target source {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                resolve_table(file, path)
            }
        }
    }
}

/// Resolve targets from any CSV reader
pub fn resolve_from_reader<R: Read>(reader: R) -> VerifyResult<Vec<VerificationTarget>> {
    resolve_table(reader, Path::new("<reader>"))
}

fn resolve_table<R: Read>(reader: R, origin: &Path) -> VerifyResult<Vec<VerificationTarget>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| config_error(origin, e))?
        .clone();
    if !headers.iter().any(|h| h == "domain") {
        return Err(VerifyError::Configuration(format!(
            "target source {} has no `domain` column",
            origin.display()
        )));
    }

    let mut targets = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| config_error(origin, e))?;
        let row: HashMap<&str, &str> = headers.iter().zip(record.iter()).collect();
        let domain = row.get("domain").copied().unwrap_or_default();
        targets.push(VerificationTarget::from_domain(domain));
    }

    debug!("Resolved {} target(s) from {}", targets.len(), origin.display());
    Ok(targets)
}

fn config_error(origin: &Path, e: csv::Error) -> VerifyError {
    VerifyError::Configuration(format!("malformed target source {}: {}", origin.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_two_rows_yield_two_targets() {
        let targets =
            resolve_from_reader("domain\nshop-a.example.com\nshop-b.example.com\n".as_bytes())
                .unwrap();
        let urls: Vec<&str> = targets.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(urls, ["http://shop-a.example.com", "http://shop-b.example.com"]);
    }

    #[test]
    fn test_extra_columns_are_combined_with_header() {
        let targets =
            resolve_from_reader("name,domain\nfirst,one.example.com\n".as_bytes()).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].url, "http://one.example.com");
    }

    #[test]
    fn test_header_only_is_empty() {
        let targets = resolve_from_reader("domain\n".as_bytes()).unwrap();
        assert!(targets.is_empty());
    }

    #[test]
    fn test_missing_domain_column() {
        let err = resolve_from_reader("host\nx.example.com\n".as_bytes()).unwrap_err();
        assert!(matches!(err, VerifyError::Configuration(_)));
    }

    #[test]
    fn test_override_ignores_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "domain\na.example.com\nb.example.com").unwrap();

        let source = TargetSource::new(Some("solo.example.com".into()), file.path().to_path_buf());
        let targets = source.resolve().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].url, "http://solo.example.com");
    }

    #[test]
    fn test_table_is_reread_each_resolve() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "domain\na.example.com").unwrap();
        let source = TargetSource::new(None, file.path().to_path_buf());
        assert_eq!(source.resolve().unwrap().len(), 1);

        writeln!(file, "b.example.com").unwrap();
        assert_eq!(source.resolve().unwrap().len(), 2);
    }

    #[test]
    fn test_unreadable_source() {
        let source = TargetSource::Table(PathBuf::from("/nonexistent/urls.csv"));
        assert!(matches!(source.resolve(), Err(VerifyError::Configuration(_))));
    }
}
