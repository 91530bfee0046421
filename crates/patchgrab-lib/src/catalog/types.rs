use serde::{Deserialize, Serialize};

/// Decompressed body of the launcher patch list endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct PatchList {
    #[serde(default)]
    pub err: bool,
    #[serde(default)]
    pub errmsg: Option<String>,
    #[serde(default)]
    pub data: Vec<PatchListEntry>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PatchListEntry {
    pub from_version: String,
    pub version: String,
    pub download_uri: String,
}
