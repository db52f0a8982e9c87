//! Advisory partial-progress snapshots written after each processed batch.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{data::table::Table, error::Result};

/// One checkpoint file per (stage, entity type, session).
///
/// Each write replaces the previous snapshot. Files are never read back by
/// the pipeline; they exist for inspecting a long run from outside.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    pub fn new(dir: impl AsRef<Path>, stage: &str, entity: &str, session_id: &str) -> Self {
        let file_name = if entity.is_empty() {
            format!("{stage}_{session_id}.csv")
        } else {
            format!("{stage}_{entity}_{session_id}.csv")
        };
        Self {
            path: dir.as_ref().join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, snapshot: &Table) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        snapshot.write_csv(File::create(&self.path)?)?;
        debug!(path = %self.path.display(), rows = snapshot.len(), "checkpoint written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_embeds_stage_entity_and_session() {
        let cp = Checkpoint::new("data/temp", "classify_texts", "text_classification", "s1");
        assert_eq!(
            cp.path(),
            Path::new("data/temp/classify_texts_text_classification_s1.csv")
        );
        let cp = Checkpoint::new("data/temp", "translation_results", "", "s2");
        assert_eq!(cp.path(), Path::new("data/temp/translation_results_s2.csv"));
    }

    #[test]
    fn write_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cp = Checkpoint::new(dir.path(), "stage", "x", "abc");
        let mut table = Table::new(vec!["id".into()]);
        table.push_row(vec![Some("1".into())]).unwrap();
        cp.write(&table).unwrap();
        table.push_row(vec![Some("2".into())]).unwrap();
        cp.write(&table).unwrap();

        let read = Table::read_csv(cp.path()).unwrap();
        assert_eq!(read.len(), 2);
    }
}
