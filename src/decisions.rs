use log::{debug, info};

use crate::store::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Remove(String),
    Rename { from: String, to: String },
}

/// Ordered remove/rename actions for one input file. Removals always precede
/// renames, so a removed term can never be renamed back into the output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionLog {
    decisions: Vec<Decision>,
}

impl DecisionLog {
    pub fn new<R, N>(removals: R, renames: N) -> Self
    where
        R: IntoIterator<Item = String>,
        N: IntoIterator<Item = (String, String)>,
    {
        let decisions = removals
            .into_iter()
            .map(Decision::Remove)
            .chain(
                renames
                    .into_iter()
                    .map(|(from, to)| Decision::Rename { from, to }),
            )
            .collect();
        Self { decisions }
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn removals(&self) -> impl Iterator<Item = &str> {
        self.decisions.iter().filter_map(|decision| match decision {
            Decision::Remove(term) => Some(term.as_str()),
            Decision::Rename { .. } => None,
        })
    }

    pub fn renames(&self) -> impl Iterator<Item = (&str, &str)> {
        self.decisions.iter().filter_map(|decision| match decision {
            Decision::Rename { from, to } => Some((from.as_str(), to.as_str())),
            Decision::Remove(_) => None,
        })
    }

    /// Applies every decision left to right. Decisions naming terms the table
    /// does not have are skipped.
    pub fn apply(&self, table: &mut Table) {
        let mut removed = 0usize;
        let mut renamed = 0usize;
        for decision in &self.decisions {
            match decision {
                Decision::Remove(term) => {
                    if table.contains(term) {
                        removed += 1;
                    } else {
                        debug!("Skipping removal of unknown column '{term}'");
                    }
                    table.remove(term);
                }
                Decision::Rename { from, to } => {
                    if table.contains(from) {
                        renamed += 1;
                    } else {
                        debug!("Skipping rename of unknown column '{from}'");
                    }
                    table.rename(from, to);
                }
            }
        }
        info!("Removed {removed} column(s) and renamed {renamed} column(s)");
    }
}
