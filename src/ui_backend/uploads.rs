//! Upload stager for the document thread
//!
//! Holds the files that will be attached to the next document query. Entries
//! are unique by (name, size); a second add with the same key is rejected.

use crate::config::UploadConfig;

use super::errors::ValidationError;
use super::types::{FileCandidate, StagedFile, StagedFileId};

/// Outcome of staging a batch of candidates
///
/// Each candidate is judged on its own; one rejection never blocks siblings.
#[derive(Debug, Default)]
pub struct StageReport {
    pub added: Vec<StagedFile>,
    pub rejected: Vec<ValidationError>,
}

#[derive(Debug, Clone)]
pub struct UploadStager {
    files: Vec<StagedFile>,
    max_file_size: u64,
    accepted_mime_type: String,
}

impl Default for UploadStager {
    fn default() -> Self {
        Self::new(&UploadConfig::default())
    }
}

impl UploadStager {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            files: Vec::new(),
            max_file_size: config.max_file_size_bytes,
            accepted_mime_type: config.accepted_mime_type.clone(),
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Check one candidate against the current set
    pub fn validate(&self, candidate: &FileCandidate) -> Result<(), ValidationError> {
        if !candidate
            .mime_type
            .eq_ignore_ascii_case(&self.accepted_mime_type)
        {
            return Err(ValidationError::NotPdf {
                name: candidate.name.clone(),
            });
        }

        if candidate.size > self.max_file_size {
            return Err(ValidationError::TooLarge {
                name: candidate.name.clone(),
                size: candidate.size,
                max: self.max_file_size,
            });
        }

        if self.contains(&candidate.name, candidate.size) {
            return Err(ValidationError::Duplicate {
                name: candidate.name.clone(),
            });
        }

        Ok(())
    }

    /// Stage a batch; later candidates see earlier ones from the same batch
    pub fn add(&mut self, candidates: Vec<FileCandidate>) -> StageReport {
        let mut report = StageReport::default();

        for candidate in candidates {
            if let Err(err) = self.validate(&candidate) {
                tracing::debug!(name_len = candidate.name.len(), kind = ?err.kind(), "Rejected upload");
                report.rejected.push(err);
                continue;
            }

            let staged = StagedFile {
                id: StagedFileId::generate(),
                name: candidate.name,
                size: candidate.size,
                handle: candidate.source,
            };
            self.files.push(staged.clone());
            report.added.push(staged);
        }

        report
    }

    /// Remove one entry; returns false if the id is unknown
    pub fn remove(&mut self, id: &StagedFileId) -> bool {
        if let Some(pos) = self.files.iter().position(|f| &f.id == id) {
            self.files.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Ordered view for display and for attaching to a query
    pub fn snapshot(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn contains(&self, name: &str, size: u64) -> bool {
        self.files.iter().any(|f| f.name == name && f.size == size)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn candidate_strategy() -> impl Strategy<Value = FileCandidate> {
        (
            prop::sample::select(vec!["a.pdf", "b.pdf", "c.pdf", "d.txt"]),
            0usize..4,
            prop::bool::weighted(0.9),
        )
            .prop_map(|(name, size, is_pdf)| {
                let mime = if is_pdf { "application/pdf" } else { "text/plain" };
                FileCandidate::from_bytes(name, mime, vec![0u8; size])
            })
    }

    // For any sequence of add calls, no two staged entries share (name, size).
    proptest! {
        #[test]
        fn prop_staged_keys_unique(
            batches in prop::collection::vec(
                prop::collection::vec(candidate_strategy(), 0..6),
                0..6,
            )
        ) {
            let mut stager = UploadStager::default();
            for batch in batches {
                stager.add(batch);
            }

            let mut seen = HashSet::new();
            for file in stager.snapshot() {
                prop_assert!(seen.insert((file.name.clone(), file.size)));
            }
        }
    }
}
