pub mod cli;
pub mod decisions;
pub mod error;
pub mod io_utils;
pub mod metadata;
pub mod session;
pub mod settings;
pub mod sources;
pub mod store;
pub mod suggest;
pub mod table;
pub mod vocabulary;

use std::{
    env,
    io::{self, BufRead, Write},
    path::Path,
    sync::OnceLock,
};

use anyhow::{Context, Result};
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::Cli,
    decisions::DecisionLog,
    session::ReconciliationSession,
    sources::SourceConfig,
    store::Table,
    suggest::MatchSuggester,
    vocabulary::VocabularyIndex,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("dwc_helper", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse_args(env::args_os())?;
    let config = SourceConfig::from_env();
    let stdin = io::stdin();
    reconcile(
        &cli.input,
        &cli.output,
        &config,
        stdin.lock(),
        io::stdout().lock(),
    )
}

/// Reads `input`, resolves its decisions (replayed from `<input>.settings` when
/// present, otherwise asked for through `prompt_in`/`prompt_out`), and writes
/// the reconciled table to `output`. Nothing is written when the input or the
/// settings are malformed.
pub fn reconcile<R, W>(
    input: &Path,
    output: &Path,
    config: &SourceConfig,
    prompt_in: R,
    prompt_out: W,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    info!("Reading '{}'", input.display());
    let records = io_utils::read_csv_file(input, true)?;
    let mut table =
        Table::from_records(records).with_context(|| format!("Importing {input:?}"))?;
    info!(
        "Imported {} column(s) and {} row(s)",
        table.len(),
        table.row_count()
    );

    let settings_path = io_utils::settings_path(input);
    let log = match settings::load(&settings_path)? {
        Some(log) => {
            info!(
                "Replaying {} saved decision(s) from {:?}",
                log.decisions().len(),
                settings_path
            );
            log
        }
        None => {
            let log = interactive_decisions(&mut table, config, prompt_in, prompt_out)?;
            match settings::save(&settings_path, &log) {
                Ok(()) => info!("Saved decisions to {settings_path:?}"),
                Err(err) => warn!("Decisions were not saved: {err:#}"),
            }
            log
        }
    };

    log.apply(&mut table);
    if table.is_empty() {
        warn!("Every column was removed; the output holds no data");
    }
    let (header, rows) = table.export()?;
    io_utils::write_csv_file(output, &header, &rows)?;
    info!(
        "Wrote {} column(s) and {} row(s) to '{}'",
        header.len(),
        rows.len(),
        output.display()
    );
    Ok(())
}

fn interactive_decisions<R, W>(
    table: &mut Table,
    config: &SourceConfig,
    prompt_in: R,
    prompt_out: W,
) -> Result<DecisionLog>
where
    R: BufRead,
    W: Write,
{
    let index = VocabularyIndex::build(
        sources::fetch_terms(config),
        sources::fetch_aliases(config),
    );
    table.annotate_aliases(|name| index.lookup(name));
    debug!("Starting interactive session");
    ReconciliationSession::new(table, MatchSuggester::new(&index), prompt_in, prompt_out).run()
}
