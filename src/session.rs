//! Interactive reconciliation of one table.
//!
//! The session is a small state machine driven by lines read from any
//! [`BufRead`]. Production wires it to stdin/stdout; tests feed it a script.
//! Removal candidates are offered first, then every remaining column can be
//! given a new name. The result is a [`DecisionLog`].

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use itertools::Itertools;
use log::debug;

use crate::{
    decisions::DecisionLog,
    error::ReconcileError,
    store::Table,
    suggest::MatchSuggester,
    table::render_table,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    ListingForRemoval,
    AwaitingRemovalChoice,
    SelectingRemovals,
    ListingForRename,
    AwaitingRenameChoice,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalChoice {
    Skip,
    RemoveAll,
    RemoveSelected,
}

impl RemovalChoice {
    const MENU: [(RemovalChoice, &'static str); 3] = [
        (RemovalChoice::Skip, "Keep every column"),
        (RemovalChoice::RemoveAll, "Remove all of them"),
        (RemovalChoice::RemoveSelected, "Choose which to remove"),
    ];
}

#[derive(Debug, Clone)]
struct RenameEntry {
    term: String,
    proposal: Option<String>,
    suggestions: Vec<String>,
}

pub struct ReconciliationSession<'a, R, W> {
    table: &'a Table,
    suggester: MatchSuggester<'a>,
    input: R,
    output: W,
    candidates: Vec<String>,
    selected: Vec<bool>,
    removals: Vec<String>,
    entries: Vec<RenameEntry>,
}

impl<'a, R, W> ReconciliationSession<'a, R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(table: &'a Table, suggester: MatchSuggester<'a>, input: R, output: W) -> Self {
        Self {
            table,
            suggester,
            input,
            output,
            candidates: Vec::new(),
            selected: Vec::new(),
            removals: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Runs the session to completion and returns the resolved decisions.
    pub fn run(mut self) -> Result<DecisionLog> {
        let mut state = SessionState::ListingForRemoval;
        while state != SessionState::Done {
            let next = self.step(state)?;
            if next != state {
                debug!("Session {state:?} -> {next:?}");
            }
            state = next;
        }
        self.output.flush().context("Flushing session output")?;

        let renames = self
            .entries
            .into_iter()
            .filter_map(|entry| match entry.proposal {
                Some(new) if new != entry.term => Some((entry.term, new)),
                _ => None,
            })
            .collect::<Vec<_>>();
        Ok(DecisionLog::new(self.removals, renames))
    }

    fn step(&mut self, state: SessionState) -> Result<SessionState> {
        match state {
            SessionState::ListingForRemoval => {
                self.candidates = self.table.removal_candidates();
                if self.candidates.is_empty() {
                    writeln!(self.output, "Every column has varying values.")?;
                    return Ok(SessionState::ListingForRename);
                }
                self.selected = vec![false; self.candidates.len()];
                writeln!(
                    self.output,
                    "These {} column(s) hold the same value in every row:",
                    self.candidates.len()
                )?;
                self.print_candidates(false)?;
                Ok(SessionState::AwaitingRemovalChoice)
            }
            SessionState::AwaitingRemovalChoice => {
                for (idx, (_, label)) in RemovalChoice::MENU.iter().enumerate() {
                    writeln!(self.output, "  {}) {label}", idx + 1)?;
                }
                let picked = self.read_number(1, RemovalChoice::MENU.len())?;
                match RemovalChoice::MENU[picked - 1].0 {
                    RemovalChoice::Skip => Ok(SessionState::ListingForRename),
                    RemovalChoice::RemoveAll => {
                        self.removals = self.candidates.clone();
                        Ok(SessionState::ListingForRename)
                    }
                    RemovalChoice::RemoveSelected => {
                        self.print_selection_help()?;
                        Ok(SessionState::SelectingRemovals)
                    }
                }
            }
            SessionState::SelectingRemovals => {
                let finish = self.candidates.len() + 1;
                match self.read_number(0, finish)? {
                    0 => self.print_candidates(true)?,
                    picked if picked == finish => {
                        self.removals = self
                            .candidates
                            .iter()
                            .zip(&self.selected)
                            .filter(|(_, selected)| **selected)
                            .map(|(term, _)| term.clone())
                            .collect();
                        return Ok(SessionState::ListingForRename);
                    }
                    picked => {
                        let flag = &mut self.selected[picked - 1];
                        *flag = !*flag;
                        let verb = if *flag { "Marked" } else { "Unmarked" };
                        writeln!(
                            self.output,
                            "{verb} '{}' for removal.",
                            self.candidates[picked - 1]
                        )?;
                    }
                }
                Ok(SessionState::SelectingRemovals)
            }
            SessionState::ListingForRename => {
                self.entries = self
                    .table
                    .terms()
                    .filter(|term| !self.removals.iter().any(|removed| removed == term))
                    .map(|term| RenameEntry {
                        term: term.to_string(),
                        proposal: None,
                        suggestions: self.suggester.suggest(term),
                    })
                    .collect();
                if self.entries.is_empty() {
                    writeln!(self.output, "No columns left to rename.")?;
                    return Ok(SessionState::Done);
                }
                self.print_entries()?;
                self.print_rename_help()?;
                Ok(SessionState::AwaitingRenameChoice)
            }
            SessionState::AwaitingRenameChoice => {
                let finish = self.entries.len() + 1;
                match self.read_number(0, finish)? {
                    0 => self.print_entries()?,
                    picked if picked == finish => return Ok(SessionState::Done),
                    picked => self.read_proposal(picked - 1)?,
                }
                Ok(SessionState::AwaitingRenameChoice)
            }
            SessionState::Done => Ok(SessionState::Done),
        }
    }

    fn read_proposal(&mut self, idx: usize) -> Result<()> {
        let term = self.entries[idx].term.clone();
        writeln!(
            self.output,
            "New name for '{term}' (empty line keeps the current name):"
        )?;
        let line = self.read_line()?.ok_or(ReconcileError::InputClosed)?;
        let proposal = line.trim();
        let entry = &mut self.entries[idx];
        if proposal.is_empty() {
            entry.proposal = None;
            writeln!(self.output, "'{term}' keeps its name.")?;
        } else {
            entry.proposal = Some(proposal.to_string());
            writeln!(self.output, "'{term}' -> '{proposal}'")?;
        }
        Ok(())
    }

    fn print_candidates(&mut self, with_selection: bool) -> Result<()> {
        let rows = self
            .candidates
            .iter()
            .enumerate()
            .map(|(idx, term)| {
                let value = self
                    .table
                    .column(term)
                    .and_then(|column| column.values.first())
                    .map(|value| {
                        if value.is_empty() {
                            "(empty)".to_string()
                        } else {
                            value.clone()
                        }
                    })
                    .unwrap_or_else(|| "(no rows)".to_string());
                let mut row = vec![(idx + 1).to_string(), term.clone(), value];
                if with_selection {
                    let mark = if self.selected[idx] { "remove" } else { "keep" };
                    row.push(mark.to_string());
                }
                row
            })
            .collect::<Vec<_>>();
        let headers: &[&str] = if with_selection {
            &["#", "column", "value", "action"]
        } else {
            &["#", "column", "value"]
        };
        write!(self.output, "{}", render_table(headers, &rows))?;
        Ok(())
    }

    fn print_selection_help(&mut self) -> Result<()> {
        self.print_candidates(true)?;
        writeln!(
            self.output,
            "Enter a column number to toggle it, 0 to show the list again, {} when done.",
            self.candidates.len() + 1
        )?;
        Ok(())
    }

    fn print_entries(&mut self) -> Result<()> {
        let rows = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let column = self.table.column(&entry.term);
                vec![
                    (idx + 1).to_string(),
                    entry.term.clone(),
                    column
                        .map(|column| column.column_type.to_string())
                        .unwrap_or_default(),
                    column
                        .and_then(|column| column.alias.clone())
                        .unwrap_or_default(),
                    entry.proposal.clone().unwrap_or_default(),
                    entry.suggestions.iter().join(", "),
                ]
            })
            .collect::<Vec<_>>();
        write!(
            self.output,
            "{}",
            render_table(
                &["#", "column", "type", "matches", "new name", "suggestions"],
                &rows
            )
        )?;
        Ok(())
    }

    fn print_rename_help(&mut self) -> Result<()> {
        writeln!(
            self.output,
            "Enter a column number to rename it, 0 to show the list again, {} when done.",
            self.entries.len() + 1
        )?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Reading operator input")?;
        if read == 0 {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }

    /// Reads lines until one holds an integer in `low..=high`.
    fn read_number(&mut self, low: usize, high: usize) -> Result<usize> {
        loop {
            write!(self.output, "> ")?;
            self.output.flush().context("Flushing session output")?;
            let line = self.read_line()?.ok_or(ReconcileError::InputClosed)?;
            match line.trim().parse::<i64>() {
                Ok(value) if value >= low as i64 && value <= high as i64 => {
                    return Ok(value as usize);
                }
                _ => {
                    writeln!(self.output, "Please enter a number from {low} to {high}.")?;
                }
            }
        }
    }
}
