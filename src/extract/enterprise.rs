use crate::error::TrimError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Short name and id of one enterprise
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct EnterpriseRecord {
    pub short_name: String,
    pub id: String,
}

/// Lookup from full legal enterprise name to its record.
///
/// Loaded from a JSON object such as `{"公司A": {"short_name": "A", "id": "1001"}}`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct EnterpriseDirectory {
    records: HashMap<String, EnterpriseRecord>,
}

impl EnterpriseDirectory {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TrimError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, TrimError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Short name and id for `name`, empty strings when the enterprise is unknown.
    pub fn lookup(&self, name: &str) -> (&str, &str) {
        self.records
            .get(name)
            .map(|record| (record.short_name.as_str(), record.id.as_str()))
            .unwrap_or(("", ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_json_directory() {
        let directory = EnterpriseDirectory::from_json(
            r#"{"公司A": {"short_name": "A公司", "id": "1001"}, "公司B": {"short_name": "B", "id": "1002"}}"#,
        )
        .unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.lookup("公司A"), ("A公司", "1001"));
        assert_eq!(directory.lookup("公司C"), ("", ""));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            EnterpriseDirectory::from_json(r#"{"公司A": "A"}"#),
            Err(TrimError::JsonError(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("enterprises.json");
        fs::write(&path, r#"{"公司A": {"short_name": "A", "id": "7"}}"#).unwrap();
        let enterprises = EnterpriseDirectory::load(&path).unwrap();
        assert_eq!(enterprises.lookup("公司A"), ("A", "7"));
    }
}
