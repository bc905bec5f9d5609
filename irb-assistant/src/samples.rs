//! Bundled sample documents.
//!
//! The same directory is served under `/samples/`, so the page can link to
//! the files the loader hands to the shell.

use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::SamplesConfig;
use crate::error::SampleLoadError;
use crate::ingestion::UploadedDocument;

/// Reads the two packaged sample PDFs
#[derive(Debug, Clone)]
pub struct SampleLoader {
    dir: PathBuf,
    form_file: String,
    policy_file: String,
}

impl SampleLoader {
    pub fn new(config: &SamplesConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            form_file: config.form_file.clone(),
            policy_file: config.policy_file.clone(),
        }
    }

    /// Directory holding the sample assets
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read both samples. Nothing is returned unless both reads succeed.
    pub async fn load(&self) -> Result<(UploadedDocument, UploadedDocument), SampleLoadError> {
        let (form, policy) = tokio::try_join!(
            self.read_sample(&self.form_file),
            self.read_sample(&self.policy_file),
        )?;

        info!(
            form = %form.filename,
            policy = %policy.filename,
            "Sample files loaded"
        );

        Ok((form, policy))
    }

    async fn read_sample(&self, file_name: &str) -> Result<UploadedDocument, SampleLoadError> {
        let path = self.dir.join(file_name);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|source| SampleLoadError::Read {
                path: path.clone(),
                source,
            })?;

        let document = UploadedDocument::new(
            file_name,
            mime::APPLICATION_PDF.essence_str(),
            Bytes::from(data),
        );
        debug!(path = %path.display(), hash = %document.content_hash, "Read sample file");

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::ingestion::pdf::extract_pdf_text;
    use tempfile::TempDir;

    fn loader_for(dir: &Path) -> SampleLoader {
        SampleLoader::new(&SamplesConfig {
            dir: dir.to_path_buf(),
            form_file: "irb_form.pdf".to_string(),
            policy_file: "irb_policy.pdf".to_string(),
        })
    }

    #[tokio::test]
    async fn test_load_reads_both_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("irb_form.pdf"), b"%PDF-form").unwrap();
        std::fs::write(temp.path().join("irb_policy.pdf"), b"%PDF-policy").unwrap();

        let (form, policy) = loader_for(temp.path()).load().await.unwrap();

        assert_eq!(form.filename, "irb_form.pdf");
        assert_eq!(form.mime_type, "application/pdf");
        assert_eq!(&form.data[..], b"%PDF-form");
        assert_eq!(policy.filename, "irb_policy.pdf");
        assert_eq!(&policy.data[..], b"%PDF-policy");
    }

    #[tokio::test]
    async fn test_missing_policy_fails_whole_load() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("irb_form.pdf"), b"%PDF-form").unwrap();

        match loader_for(temp.path()).load().await {
            Err(SampleLoadError::Read { path, .. }) => {
                assert!(path.ends_with("irb_policy.pdf"));
            }
            other => panic!("Expected Read error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_packaged_samples_contain_text() {
        let loader = SampleLoader::new(&AppConfig::default().samples);
        let (form, policy) = loader.load().await.unwrap();

        let form_text = extract_pdf_text(&form.filename, &form.data).unwrap();
        let policy_text = extract_pdf_text(&policy.filename, &policy.data).unwrap();

        assert!(form_text.contains("IRB Application Form"));
        assert!(policy_text.contains("IRB Policy"));
    }
}
