use std::{ffi::OsString, path::PathBuf};

use clap::{Parser, error::ErrorKind};

use crate::error::ReconcileError;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reconcile CSV column headers with Simple Darwin Core terms",
    long_about = None
)]
pub struct Cli {
    /// CSV file to read; decisions are stored next to it as <input>.settings
    pub input: PathBuf,
    /// CSV file to write with the reconciled columns
    pub output: PathBuf,
}

impl Cli {
    /// Parses `args`, mapping any arity or unknown-argument failure to
    /// [`ReconcileError::Usage`]. `--help` and `--version` print and exit.
    pub fn parse_args<I, T>(args: I) -> Result<Self, ReconcileError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Cli::try_parse_from(args) {
            Ok(cli) => Ok(cli),
            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                err.exit()
            }
            Err(_) => Err(ReconcileError::Usage),
        }
    }
}
