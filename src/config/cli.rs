use crate::domain::ports::Workspace;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// 以實驗工作目錄為根的本機檔案工作區
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    base_path: String,
}

impl LocalWorkspace {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }
}

impl Workspace for LocalWorkspace {
    async fn write_script(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        let full_path = Path::new(&self.base_path).join(file_name);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&full_path, content)?;

        // 排程器會直接執行包裝腳本
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, fs::Permissions::from_mode(0o755))?;
        }

        Ok(full_path)
    }

    async fn read_script(&self, file_name: &str) -> Result<String> {
        let full_path = Path::new(&self.base_path).join(file_name);
        let content = fs::read_to_string(full_path)?;
        Ok(content)
    }
}
