mod capability;

pub use capability::OutputCapability;

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::job::Job;

pub const ARCHIVE_FILE: &str = "generated_images.json";

/// Archival copy of one saved result image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImageRecord {
    pub job_id: String,
    pub image_id: String,
    pub model_id: String,
    #[serde(default)]
    pub adapter_ids: Vec<String>,
    pub prompt: String,
    pub seed: String,
    pub remote_url: String,
    pub local_path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveFile {
    #[serde(default)]
    output_capability_token: Option<String>,
    #[serde(default)]
    records: Vec<GeneratedImageRecord>,
}

/// Asks the user for an output directory. `None` means they backed out.
#[async_trait]
pub trait DirectoryChooser: Send + Sync {
    async fn choose_directory(&self) -> Option<PathBuf>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    pub saved: Vec<PathBuf>,
    pub skipped: usize,
}

/// Output directory grant plus the append-only history of saved images.
#[derive(Debug)]
pub struct OutputArchive {
    path: PathBuf,
    capability: Option<OutputCapability>,
    records: Vec<GeneratedImageRecord>,
}

impl OutputArchive {
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let file: ArchiveFile = match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ArchiveFile::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            capability: file.output_capability_token.map(OutputCapability::from_token),
            records: file.records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[GeneratedImageRecord] {
        &self.records
    }

    pub fn capability(&self) -> Option<&OutputCapability> {
        self.capability.as_ref()
    }

    /// Drop the persisted grant so the next resolve asks the chooser again.
    pub async fn forget_capability(&mut self) -> Result<()> {
        if self.capability.take().is_some() {
            self.persist().await?;
        }
        Ok(())
    }

    /// Reuse the persisted directory grant, or ask `chooser` for a new one.
    /// Returns `Ok(None)` when no usable directory was picked.
    pub async fn resolve_output_directory(&mut self, chooser: &dyn DirectoryChooser) -> Result<Option<PathBuf>> {
        if let Some(capability) = &self.capability {
            match capability.resolve().await {
                Ok(dir) => return Ok(Some(dir)),
                Err(Error::StaleCapability) => {
                    warn!("Stored output directory is no longer usable, discarding it");
                    self.capability = None;
                    self.persist().await?;
                }
                Err(e) => return Err(e),
            }
        }

        let Some(dir) = chooser.choose_directory().await else {
            info!("No output directory chosen, not saving");
            return Ok(None);
        };

        let capability = OutputCapability::issue(&dir)?;
        match capability.resolve().await {
            Ok(dir) => {
                self.capability = Some(capability);
                self.persist().await?;
                Ok(Some(dir))
            }
            Err(Error::StaleCapability) => {
                warn!("Chosen directory {} is not writable", dir.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Write every downloaded image of `job` into `dir` as `<image id>.png`
    /// and record the ones that made it. Failed writes are logged and skipped.
    pub async fn save(&mut self, job: &mut Job, dir: &Path) -> Result<SaveReport> {
        let job_id = job.job_id.clone().ok_or(Error::MissingJobId)?;
        let mut report = SaveReport::default();
        let mut new_records = Vec::new();

        for image in job.images.iter_mut() {
            let Some(file_name) = image_file_name(&image.image_id) else {
                warn!("Image id {:?} is not a plain file name, skipping", image.image_id);
                report.skipped += 1;
                continue;
            };
            let target = dir.join(file_name);

            if let Err(e) = tokio::fs::write(&target, &image.bytes).await {
                warn!("Failed to write {}: {}", target.display(), e);
                report.skipped += 1;
                continue;
            }

            image.local_path = Some(target.clone());
            new_records.push(GeneratedImageRecord {
                job_id: job_id.clone(),
                image_id: image.image_id.clone(),
                model_id: job.model_id.clone(),
                adapter_ids: job.adapter_ids.clone(),
                prompt: job.prompt.clone(),
                seed: image.seed.clone(),
                remote_url: image.url.clone(),
                local_path: target.clone(),
            });
            report.saved.push(target);
        }

        if !new_records.is_empty() {
            self.records.extend(new_records);
            self.persist().await?;
        }

        info!("Saved {} image(s) of job {}, skipped {}", report.saved.len(), job_id, report.skipped);
        Ok(report)
    }

    /// Resolve a directory and save into it. `Ok(None)` if the user aborted.
    pub async fn save_job(&mut self, job: &mut Job, chooser: &dyn DirectoryChooser) -> Result<Option<SaveReport>> {
        if job.job_id().is_none() {
            return Err(Error::MissingJobId);
        }

        let Some(dir) = self.resolve_output_directory(chooser).await? else {
            return Ok(None);
        };
        self.save(job, &dir).await.map(Some)
    }

    async fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = ArchiveFile {
            output_capability_token: self.capability.as_ref().map(|c| c.token().to_string()),
            records: self.records.clone(),
        };
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&file)?).await?;
        Ok(())
    }
}

/// `<image id>.png`, provided the id cannot address anything outside the
/// output directory.
fn image_file_name(image_id: &str) -> Option<String> {
    let plain = !image_id.is_empty()
        && image_id != "."
        && image_id != ".."
        && !image_id.contains(['/', '\\', ':', '\0']);

    plain.then(|| format!("{}.png", image_id))
}
