use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

fn default_api_url() -> Url {
    Url::parse(crate::google::DEFAULT_API_URL).expect("default API URL is valid")
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum StoreConfig {
    /// In-process store, seeded with the listed (empty) sheets.
    Memory {
        #[serde(default)]
        sheets: Vec<String>,
    },
    Filesystem {
        base_dir: PathBuf,
    },
    GoogleSheets {
        access_token_env: String,
        #[serde(default = "default_api_url")]
        api_url: Url,
    },
}
