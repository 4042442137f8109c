use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shapes::IntOrString;

/// RepositoryInfo is one entry of the repository listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoryInfo {
    pub id: String,
    pub title: String,
    pub uri: String,
    pub external_url: String,
    pub local: bool,
    #[serde(rename = "type")]
    pub repository_type: String,
    pub sesame_type: String,
    pub location: String,
    pub readable: bool,
    pub writable: bool,
    pub unsupported: bool,
    pub state: String,
}

/// RepositorySize counts statements in a repository
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepositorySize {
    pub inferred: i64,
    pub total: i64,
    pub explicit: i64,
}

/// RepositoryConfig is the JSON form of a repository definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoryConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub repository_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sesame_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, RepositoryConfigParameter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepositoryConfigParameter {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<IntOrString>,
}

/// ImportSettings describes a server-side import file and its parser options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportSettings {
    pub name: String,
    pub status: String,
    pub message: String,
    pub context: String,
    pub replace_graphs: Vec<String>,
    #[serde(rename = "baseURI")]
    pub base_uri: String,
    pub force_serial: bool,
    #[serde(rename = "type")]
    pub import_type: String,
    pub format: String,
    pub data: String,
    pub parser_settings: ParserSettings,
    pub size: String,
    pub last_modified: i64,
    pub imported: i64,
    pub added_statements: i64,
    pub removed_statements: i64,
    pub num_replaced_graphs: i64,
    pub file_size: i64,
    pub file_last_modified: String,
    pub added_removed_statements: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserSettings {
    #[serde(rename = "preserveBNodeIds")]
    pub preserve_bnode_ids: bool,
    pub fail_on_unknown_data_types: bool,
    pub verify_data_type_values: bool,
    pub normalize_data_type_values: bool,
    pub fail_on_unknown_language_tags: bool,
    pub verify_language_tags: bool,
    pub normalize_language_tags: bool,
    pub stop_on_error: bool,
    pub context_link: String,
}

/// Request body for importing files that already sit on the server
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerImportRequest {
    pub file_names: Vec<String>,
    pub import_settings: ImportSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SparqlTemplate {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub query: String,
}

/// SqlView maps a SPARQL query onto a relational table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SqlView {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub query: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<SqlColumn>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SqlColumn {
    #[serde(rename = "column_name", skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "column_type", skip_serializing_if = "String::is_empty")]
    pub column_type: String,
    pub sql_type_precision: i32,
    pub sql_type_scale: i32,
    pub nullable: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sparql_type: String,
}

/// Location is a local or remote data location attached to the workbench
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Location {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uri: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub auth_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub location_type: String,
    pub active: bool,
    pub local: bool,
    pub system: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error_msg: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_repository: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SavedQuery {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    pub shared: bool,
}

/// VersionInfo reports the product and bundled component versions
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VersionInfo {
    #[serde(rename = "productType")]
    pub product: String,
    #[serde(rename = "productVersion")]
    pub version: String,
    pub connectors: String,
    pub sesame: String,
    #[serde(rename = "Workbench")]
    pub workbench: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct LicenseInfo {
    pub version: String,
    pub valid: bool,
    pub message: String,
    pub installation_id: String,
    pub licensee: String,
    pub product: String,
    pub type_of_use: String,
    pub max_cpu_cores: i32,
    pub expiry_date: String,
    pub latest_publication_date: i64,
    pub license_capabilities: Vec<String>,
    pub product_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repository_info_tolerates_missing_fields() {
        let info: RepositoryInfo =
            serde_json::from_value(json!({"id": "movies", "type": "graphdb", "readable": true}))
                .unwrap();
        assert_eq!(info.id, "movies");
        assert_eq!(info.repository_type, "graphdb");
        assert!(info.readable);
        assert!(!info.writable);
    }

    #[test]
    fn test_repository_config_omits_empty_fields() {
        let mut config = RepositoryConfig {
            id: "movies".to_string(),
            ..Default::default()
        };
        config.params.insert(
            "entityIndexSize".to_string(),
            RepositoryConfigParameter {
                name: "entityIndexSize".to_string(),
                label: String::new(),
                value: Some(IntOrString::Int(10_000_000)),
            },
        );

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({"id": "movies", "params": {"entityIndexSize": {"name": "entityIndexSize", "value": 10000000}}})
        );
    }

    #[test]
    fn test_version_info_field_names() {
        let version: VersionInfo = serde_json::from_value(json!({
            "productType": "enterprise",
            "productVersion": "10.8.0",
            "Workbench": "2.8.0"
        }))
        .unwrap();
        assert_eq!(version.product, "enterprise");
        assert_eq!(version.version, "10.8.0");
        assert_eq!(version.workbench, "2.8.0");
    }
}
