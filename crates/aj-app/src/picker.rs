use std::path::PathBuf;
use aj_core::DirectoryChooser;
use async_trait::async_trait;

/// Native folder dialog.
pub struct RfdDirectoryChooser {
    title: String,
}

impl Default for RfdDirectoryChooser {
    fn default() -> Self {
        Self {
            title: "Choose where to save generated images".to_string(),
        }
    }
}

#[async_trait]
impl DirectoryChooser for RfdDirectoryChooser {
    async fn choose_directory(&self) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_title(self.title.as_str())
            .pick_folder()
            .await
            .map(|handle| handle.path().to_path_buf())
    }
}

/// Always answers with the directory given on the command line.
pub struct FixedDirectoryChooser(pub PathBuf);

#[async_trait]
impl DirectoryChooser for FixedDirectoryChooser {
    async fn choose_directory(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}
