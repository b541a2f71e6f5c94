use std::{
    collections::HashMap,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use ethers::types::Address;
use tracing::debug;
use uuid::Uuid;

use super::PoolStore;
use crate::core::{PoolError, Result};
use crate::pool::PoolSnapshot;

/// 每个池一个JSON文件: `{base_path}/{pool:?}.json`
///
/// 先写入唯一命名的临时文件再重命名覆盖，读者不会看到写了一半的文件
#[derive(Debug, Clone)]
pub struct FileStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    base_path: PathBuf,
    /// 每个池已保存的次数
    saves: HashMap<Address, u64>,
}

impl FileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                base_path,
                saves: HashMap::new(),
            })),
        })
    }

    pub fn base_path(&self) -> Result<PathBuf> {
        let inner = self.inner.lock().map_err(|_| PoolError::StatePoisoned)?;
        Ok(inner.base_path.clone())
    }

    /// 本进程内保存某个池的次数
    pub fn save_count(&self, pool: Address) -> Result<u64> {
        let inner = self.inner.lock().map_err(|_| PoolError::StatePoisoned)?;
        Ok(inner.saves.get(&pool).copied().unwrap_or_default())
    }
}

impl Inner {
    fn pool_path(&self, pool: Address) -> PathBuf {
        self.base_path.join(format!("{:?}.json", pool))
    }
}

impl PoolStore for FileStore {
    fn save(&self, snapshot: &PoolSnapshot) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| PoolError::StatePoisoned)?;
        let pool = snapshot.params.address;
        let path = inner.pool_path(pool);
        let tmp_path = inner
            .base_path
            .join(format!(".{:?}.{}.tmp", pool, Uuid::new_v4()));

        let write = || -> Result<()> {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, snapshot)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            fs::rename(&tmp_path, &path)?;
            Ok(())
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        *inner.saves.entry(pool).or_default() += 1;
        debug!(?pool, path = %path.display(), "pool snapshot saved");
        Ok(())
    }

    fn load(&self, pool: Address) -> Result<Option<PoolSnapshot>> {
        let inner = self.inner.lock().map_err(|_| PoolError::StatePoisoned)?;
        let path = inner.pool_path(pool);
        if !path.exists() {
            debug!(?pool, "no pool snapshot");
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&path)?);
        let snapshot: PoolSnapshot = serde_json::from_reader(reader)?;
        if snapshot.params.address != pool {
            return Err(PoolError::Storage(format!(
                "快照地址不匹配: 期望 {:?}, 实际 {:?}",
                pool, snapshot.params.address
            )));
        }
        Ok(Some(snapshot))
    }
}
