//! JSON file provider.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::RwLock;

use super::ConfigResult;
use super::provider::ConfigProvider;

/// Reads a JSON document once and serves nested keys with dot notation:
/// `tariff.base_fee` looks up `{"tariff": {"base_fee": ...}}`. A missing file
/// behaves as an empty document.
pub struct FileConfigProvider {
    path: PathBuf,
    data: RwLock<Option<Value>>,
}

impl FileConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> ConfigResult<Value> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(Value::Object(Default::default()));
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Drops the cached document and reads the file again.
    pub async fn reload(&self) -> ConfigResult<()> {
        let fresh = self.load().await?;
        *self.data.write().await = Some(fresh);
        Ok(())
    }

    async fn ensure_loaded(&self) -> ConfigResult<()> {
        if self.data.read().await.is_some() {
            return Ok(());
        }
        let mut data = self.data.write().await;
        if data.is_none() {
            *data = Some(self.load().await?);
        }
        Ok(())
    }
}

fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(root, |current, part| current.get(part))
}

#[async_trait::async_trait]
impl ConfigProvider for FileConfigProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        self.ensure_loaded().await?;

        let data = self.data.read().await;
        let value = data.as_ref().and_then(|root| lookup(root, key));
        Ok(match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(v) => Some(v.to_string()),
        })
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .finish()
    }
}
