//! End-to-end processing of merge groups
//!
//! Each group is loaded, merged, reassembled and written on its own. Errors
//! in one group are logged and never stop the remaining groups.

use crate::errors::{AppError, AppResult};
use crate::ingestor::EpgIngestor;
use crate::merger::{ChannelMerger, MergeSettings};
use crate::models::{MergeGroup, MergeReport};
use crate::utils::xml_writer::write_document;
use tracing::{error, info, warn};

/// Outcome of one merge group
#[derive(Debug)]
pub struct GroupOutcome {
    pub group: MergeGroup,
    pub result: AppResult<MergeReport>,
}

impl GroupOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct EpgMergeService {
    ingestor: EpgIngestor,
    settings: MergeSettings,
    dry_run: bool,
}

impl EpgMergeService {
    pub fn new(settings: MergeSettings) -> Self {
        Self {
            ingestor: EpgIngestor::new(),
            settings,
            dry_run: false,
        }
    }

    /// Merge without writing any output
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one merge group end to end
    pub fn run_group(&self, group: &MergeGroup) -> AppResult<MergeReport> {
        info!(
            "▶ Merging {:?} -> {}",
            group
                .inputs
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>(),
            group.output.display()
        );

        let base_path = group
            .base()
            .ok_or_else(|| AppError::missing_base(&group.output, "merge group has no inputs"))?;
        let base = self.ingestor.load(base_path).map_err(|e| {
            warn!(
                "Base input {} unavailable, {} will not be generated",
                e.path().display(),
                group.output.display()
            );
            AppError::missing_base(&group.output, e.to_string())
        })?;

        let mut merger = ChannelMerger::from_base(base, &self.settings);
        merger.report_mut().inputs_loaded += 1;

        for path in group.inputs.iter().skip(1) {
            if let Some(document) = self.ingestor.load_or_warn(path, merger.report_mut()) {
                merger.merge_document(document);
            }
        }

        let (guide, mut report) = merger.finish();
        let document = guide.into_document(&mut report);

        if self.dry_run {
            info!("Dry run, not writing {}: {}", group.output.display(), report);
            return Ok(report);
        }

        write_document(&document, &group.output)?;
        info!("✅ Merged -> {} ({})", group.output.display(), report);
        Ok(report)
    }

    /// Run every group, logging failures instead of propagating them
    pub fn run_all(&self, groups: &[MergeGroup]) -> Vec<GroupOutcome> {
        groups
            .iter()
            .map(|group| {
                let result = self.run_group(group);
                if let Err(e) = &result {
                    error!("Merge group '{}' produced no output: {}", group.label(), e);
                }
                GroupOutcome {
                    group: group.clone(),
                    result,
                }
            })
            .collect()
    }
}
