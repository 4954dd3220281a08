//! Field extraction from raw metadata documents.
//!
//! A [`PackageDocument`] is the typed shape of the index's per-package JSON
//! API response. [`extract`] projects one document into exactly one
//! [`PackageRecord`]; a document missing a required section fails extraction
//! for that record only, it is never padded out with partial defaults.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify;
use crate::model::PackageRecord;

/// Raw per-package metadata document.
///
/// All three top-level sections are optional at the serde level so that a
/// degenerate document still deserializes; [`extract`] is where absence
/// becomes an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDocument {
    pub info: Option<PackageInfo>,
    pub urls: Option<Vec<DistributionFile>>,
    /// Full release history: version string to that release's artifact list.
    /// Only the key set matters here; artifact bodies are kept raw.
    pub releases: Option<HashMap<String, serde_json::Value>>,
}

/// The `info` section. Nearly every field is nullable on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub project_url: Option<String>,
    pub requires_python: Option<String>,
    pub license: Option<String>,
    #[serde(default)]
    pub classifiers: Vec<String>,
}

/// One distribution artifact of the latest release.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistributionFile {
    #[serde(default)]
    pub upload_time: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub packagetype: String,
}

/// Errors from projecting a document into a record.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A required top-level section (`info`, `urls`, `releases`) is absent.
    #[error("document is missing required section '{0}'")]
    MissingSection(&'static str),
}

/// Projects one metadata document into a [`PackageRecord`].
///
/// `last_release_date` is the upload time of the first artifact in the
/// latest release's list, in whatever order the index returned them; empty
/// when the release has no artifacts. `package_size` sums the latest
/// release's artifacts only, while `release_count` spans the whole history,
/// counting yanked/empty releases too.
pub fn extract(document: PackageDocument) -> Result<PackageRecord, ExtractError> {
    let info = document
        .info
        .ok_or(ExtractError::MissingSection("info"))?;
    let urls = document
        .urls
        .ok_or(ExtractError::MissingSection("urls"))?;
    let releases = document
        .releases
        .ok_or(ExtractError::MissingSection("releases"))?;

    let last_release_date = urls
        .first()
        .map(|u| u.upload_time.clone())
        .unwrap_or_default();
    let package_size = urls.iter().map(|u| u.size).sum();
    let has_wheel = has_artifact_kind(&urls, "wheel");
    let has_egg = has_artifact_kind(&urls, "egg");

    let development_status = classify::development_status(&info.classifiers);
    let intended_audience = classify::intended_audience(&info.classifiers);

    Ok(PackageRecord {
        name: info.name.unwrap_or_default(),
        version: info.version.unwrap_or_default(),
        summary: info.summary.unwrap_or_default(),
        author: info.author.unwrap_or_default(),
        author_email: info.author_email.unwrap_or_default(),
        project_url: info.project_url.unwrap_or_default(),
        requires_python: info.requires_python.unwrap_or_default(),
        license: info.license.unwrap_or_default(),
        last_release_date,
        release_count: releases.len(),
        package_size,
        has_wheel,
        has_egg,
        development_status,
        intended_audience,
    })
}

fn has_artifact_kind(urls: &[DistributionFile], kind: &str) -> bool {
    urls.iter()
        .any(|u| u.packagetype.to_ascii_lowercase().contains(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: serde_json::Value) -> PackageDocument {
        serde_json::from_value(value).expect("test document must deserialize")
    }

    fn full_document() -> serde_json::Value {
        json!({
            "info": {
                "name": "fpga-toolkit",
                "version": "0.3.1",
                "summary": "Bitstream utilities",
                "author": "Ada",
                "author_email": "ada@example.org",
                "project_url": "https://pypi.org/project/fpga-toolkit/",
                "requires_python": ">=3.8",
                "license": "MIT",
                "classifiers": [
                    "Development Status :: 4 - Beta",
                    "Intended Audience :: Developers"
                ]
            },
            "urls": [
                {"upload_time": "2024-05-01T12:00:00", "size": 100, "packagetype": "bdist_wheel"},
                {"upload_time": "2024-05-01T12:01:00", "size": 250, "packagetype": "sdist"}
            ],
            "releases": {
                "0.1.0": [{"size": 10}],
                "0.2.0": [],
                "0.3.1": [{"size": 100}, {"size": 250}]
            }
        })
    }

    #[test]
    fn test_extract_full_document() {
        let record = extract(document(full_document())).unwrap();
        assert_eq!(record.name, "fpga-toolkit");
        assert_eq!(record.version, "0.3.1");
        assert_eq!(record.last_release_date, "2024-05-01T12:00:00");
        assert_eq!(record.package_size, 350);
        assert_eq!(record.release_count, 3, "empty releases count too");
        assert!(record.has_wheel);
        assert!(!record.has_egg);
        assert_eq!(record.development_status, "Beta");
        assert_eq!(record.intended_audience, "Developers");
    }

    #[test]
    fn test_extract_no_artifacts() {
        let record = extract(document(json!({
            "info": {"name": "bare", "version": "1.0"},
            "urls": [],
            "releases": {"1.0": []}
        })))
        .unwrap();
        assert_eq!(record.last_release_date, "");
        assert_eq!(record.package_size, 0);
        assert!(!record.has_wheel);
        assert!(!record.has_egg);
        assert_eq!(record.development_status, "Not specified");
        assert_eq!(record.intended_audience, "Not specified");
    }

    #[test]
    fn test_wheel_detection_is_case_insensitive() {
        let record = extract(document(json!({
            "info": {"name": "w"},
            "urls": [{"packagetype": "BDIST_WHEEL", "size": 1, "upload_time": "t"}],
            "releases": {}
        })))
        .unwrap();
        assert!(record.has_wheel);
    }

    #[test]
    fn test_egg_detection() {
        let record = extract(document(json!({
            "info": {"name": "e"},
            "urls": [{"packagetype": "bdist_egg", "size": 1, "upload_time": "t"}],
            "releases": {}
        })))
        .unwrap();
        assert!(record.has_egg);
        assert!(!record.has_wheel);
    }

    #[test]
    fn test_nullable_info_fields_become_empty() {
        let record = extract(document(json!({
            "info": {
                "name": "sparse",
                "version": null,
                "author": null,
                "license": null
            },
            "urls": [],
            "releases": {}
        })))
        .unwrap();
        assert_eq!(record.version, "");
        assert_eq!(record.author, "");
        assert_eq!(record.license, "");
    }

    #[test]
    fn test_missing_sections_fail_extraction() {
        let err = extract(document(json!({"urls": [], "releases": {}}))).unwrap_err();
        assert!(matches!(err, ExtractError::MissingSection("info")));

        let err = extract(document(json!({"info": {}, "releases": {}}))).unwrap_err();
        assert!(matches!(err, ExtractError::MissingSection("urls")));

        let err = extract(document(json!({"info": {}, "urls": []}))).unwrap_err();
        assert!(matches!(err, ExtractError::MissingSection("releases")));
    }
}
