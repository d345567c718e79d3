use crate::config::AppConfig;
use crate::error::Error;
use crate::index::{DatHeader, ItemIndex};
use crate::model::ItemField;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// External parser contract: produce a flat item index from one catalog
/// file, with every item's `Source.index` set to `index_id`.
pub trait DatParser: Sync {
    fn parse(&self, path: &Path, index_id: usize, keep_paths: bool) -> Result<ItemIndex, Error>;
}

/// External writer contract.
pub trait DatWriter: Sync {
    fn write(&self, index: &ItemIndex, path: &Path) -> Result<bool, Error>;
}

/// Orchestration over the external parser/writer boundary.
///
/// Inputs and outputs are processed in parallel. A failure on one of them is
/// caught here, logged, and that sibling abandoned — unless `strict` is
/// configured, in which case the first error propagates.
pub struct DatEngine {
    config: AppConfig,
}

impl DatEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse every input in parallel, assigning `Source.index` by position in
    /// load order. Failed inputs are skipped (or fatal under `strict`);
    /// surviving indexes keep their original source indexes, so cascade-style
    /// partitions stay aligned with `paths`.
    pub fn populate(
        &self,
        parser: &dyn DatParser,
        paths: &[PathBuf],
        keep_paths: bool,
    ) -> Result<Vec<ItemIndex>, Error> {
        info!("Parsing {} inputs...", paths.len());
        let start = Instant::now();

        let results: Vec<Result<ItemIndex, Error>> = paths
            .par_iter()
            .enumerate()
            .map(|(index_id, path)| parser.parse(path, index_id, keep_paths))
            .collect();

        let mut indexes = Vec::with_capacity(paths.len());
        for (path, result) in paths.iter().zip(results) {
            match result {
                Ok(index) => indexes.push(index),
                Err(err) if self.config.strict => return Err(err),
                Err(err) => error!("Skipping input '{}': {}", path.display(), err),
            }
        }

        debug!(
            "Parsed {} of {} inputs in {:.2}s",
            indexes.len(),
            paths.len(),
            start.elapsed().as_secs_f64(),
        );
        Ok(indexes)
    }

    /// Combine parsed inputs into one machine-bucketed index, optionally
    /// collapsing duplicates (which assigns the provenance tags the diff
    /// projections rely on).
    pub fn merge(&self, inputs: Vec<ItemIndex>, dedupe: bool) -> ItemIndex {
        let mut iter = inputs.into_iter();
        let Some(mut merged) = iter.next() else {
            return ItemIndex::new(DatHeader::default());
        };

        merged.bucket_by(ItemField::Machine, false);
        for index in iter {
            merged.absorb(index);
        }
        if dedupe {
            merged.bucket_by(ItemField::Machine, true);
        }
        merged
    }

    /// Hand every index to the writer in parallel. Returns how many outputs
    /// reported success.
    pub fn write_all(
        &self,
        writer: &dyn DatWriter,
        outputs: &[(ItemIndex, PathBuf)],
    ) -> Result<usize, Error> {
        let results: Vec<(usize, Result<bool, Error>)> = outputs
            .par_iter()
            .enumerate()
            .map(|(i, (index, path))| (i, writer.write(index, path)))
            .collect();

        let mut written = 0;
        for (i, result) in results {
            let path = &outputs[i].1;
            match result {
                Ok(true) => written += 1,
                Ok(false) => error!("Writer declined output '{}'", path.display()),
                Err(err) if self.config.strict => return Err(err),
                Err(err) => error!("Skipping output '{}': {}", path.display(), err),
            }
        }
        Ok(written)
    }
}
