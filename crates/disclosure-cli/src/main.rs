mod display;
mod profile;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use disclosure_core::{
    Department, DumpStage, FetchSummary, IdentityVendors, Limit, ParseSummary, RunContext,
    Settings, VendorLookup, VendorTable,
};
use disclosure_crawl::{CrawlError, FetchOrchestrator, HttpClient, ParseOrchestrator};
use disclosure_store::{Paths, RecordStore};
use tracing::{error, info};

use crate::profile::DepartmentProfile;

#[derive(Debug, Parser)]
#[command(name = "disclosure", version, about = "Crawl and normalize contract-disclosure pages")]
struct Cli {
    #[command(flatten)]
    options: Options,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download index, quarter and contract pages for each department profile.
    Fetch {
        #[arg(required = true)]
        profiles: Vec<PathBuf>,
    },
    /// Normalize cached contract pages into records.
    Parse {
        #[arg(required = true)]
        profiles: Vec<PathBuf>,
    },
    /// Fetch then parse.
    Run {
        #[arg(required = true)]
        profiles: Vec<PathBuf>,
    },
    /// Print a stored record, or list a department's record stems.
    Show {
        acronym: String,
        stem: Option<String>,
    },
}

#[derive(Debug, Args)]
struct Options {
    /// Re-download contract pages that are already cached.
    #[arg(long, global = true, env = "DISCLOSURE_REDOWNLOAD")]
    redownload: bool,

    /// Pause after every download, in seconds.
    #[arg(long, global = true, env = "DISCLOSURE_SLEEP_SECONDS", default_value_t = 0.0)]
    sleep_seconds: f64,

    /// Quarters processed per department (0 = unlimited).
    #[arg(long, global = true, env = "DISCLOSURE_QUARTER_LIMIT", default_value_t = 0)]
    quarter_limit: usize,

    /// Contract pages fetched per quarter (0 = unlimited).
    #[arg(long, global = true, env = "DISCLOSURE_CONTRACT_LIMIT", default_value_t = 0)]
    contract_limit: usize,

    /// Raw pages parsed per department (0 = unlimited).
    #[arg(long, global = true, env = "DISCLOSURE_FILE_LIMIT", default_value_t = 0)]
    file_limit: usize,

    /// Canonicalize vendor names.
    #[arg(long, global = true, env = "DISCLOSURE_VENDOR_CLEANUP")]
    vendor_cleanup: bool,

    /// JSON vendor table (`{"Canonical": ["variant", ...]}`).
    #[arg(long, global = true, env = "DISCLOSURE_VENDOR_TABLE")]
    vendor_table: Option<PathBuf>,

    /// Fill empty contract and original values.
    #[arg(
        long,
        global = true,
        env = "DISCLOSURE_ASSURE_VALUES",
        default_value_t = true,
        action = ArgAction::Set
    )]
    assure_values: bool,

    /// Print the URLs of one traversal stage and stop before downloading.
    #[arg(long, global = true, env = "DISCLOSURE_DUMP", value_enum)]
    dump: Option<Dump>,

    #[arg(long, global = true, env = "DISCLOSURE_RAW_ROOT", default_value = "raw-data")]
    raw_root: PathBuf,

    #[arg(long, global = true, env = "DISCLOSURE_METADATA_ROOT", default_value = "metadata")]
    metadata_root: PathBuf,

    #[arg(long, global = true, env = "DISCLOSURE_OUTPUT_ROOT", default_value = "generated-data")]
    output_root: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Dump {
    QuarterUrls,
    ContractUrls,
}

impl Options {
    fn settings(&self) -> anyhow::Result<Settings> {
        let download_delay = Duration::try_from_secs_f64(self.sleep_seconds)
            .with_context(|| format!("invalid --sleep-seconds {}", self.sleep_seconds))?;
        Ok(Settings {
            redownload: self.redownload,
            download_delay,
            quarter_limit: Limit(self.quarter_limit),
            contract_limit: Limit(self.contract_limit),
            file_limit: Limit(self.file_limit),
            vendor_cleanup: self.vendor_cleanup,
            assure_values: self.assure_values,
            dump: self.dump.map(|d| match d {
                Dump::QuarterUrls => DumpStage::QuarterUrls,
                Dump::ContractUrls => DumpStage::ContractUrls,
            }),
        })
    }

    fn paths(&self) -> Paths {
        Paths::new(&self.raw_root, &self.metadata_root, &self.output_root)
    }

    fn vendors(&self) -> anyhow::Result<Box<dyn VendorLookup>> {
        match &self.vendor_table {
            Some(path) => {
                let table = VendorTable::from_file(path)
                    .with_context(|| format!("loading vendor table {}", path.display()))?;
                info!(entries = table.len(), "vendor table loaded");
                Ok(Box::new(table))
            }
            None => Ok(Box::new(IdentityVendors)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Phases {
    fetch: bool,
    parse: bool,
}

impl Phases {
    const FETCH: Phases = Phases { fetch: true, parse: false };
    const PARSE: Phases = Phases { fetch: false, parse: true };
    const BOTH: Phases = Phases { fetch: true, parse: true };
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    info!("disclosure v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let paths = cli.options.paths();
    let (profiles, phases) = match &cli.command {
        Command::Fetch { profiles } => (profiles, Phases::FETCH),
        Command::Parse { profiles } => (profiles, Phases::PARSE),
        Command::Run { profiles } => (profiles, Phases::BOTH),
        Command::Show { acronym, stem } => return show(&paths, acronym, stem.as_deref()),
    };
    crawl(&cli.options, &paths, profiles, phases)
}

fn crawl(
    options: &Options,
    paths: &Paths,
    profiles: &[PathBuf],
    phases: Phases,
) -> anyhow::Result<()> {
    let settings = options.settings()?;
    let departments = profiles
        .iter()
        .map(|path| load_department(path))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let vendors = options.vendors()?;
    let client = if phases.fetch {
        Some(HttpClient::new().context("building HTTP client")?)
    } else {
        None
    };

    let mut unavailable = Vec::new();
    for department in &departments {
        let acronym = department.acronym();
        if let Some(client) = &client {
            let mut ctx = RunContext::default();
            match FetchOrchestrator::new(department, &settings, paths, client).run(&mut ctx) {
                Ok(summary) => print_fetch_summary(acronym, &summary),
                Err(CrawlError::IndexUnavailable { url, reason }) => {
                    error!(
                        department = acronym,
                        url = %url,
                        reason = %reason,
                        "index page unavailable, skipping department"
                    );
                    unavailable.push(acronym.to_string());
                    continue;
                }
                Err(e) => return Err(e).with_context(|| format!("fetching {acronym}")),
            }
            if settings.dump.is_some() {
                continue;
            }
        }
        if phases.parse {
            let summary = ParseOrchestrator::new(department, &settings, paths, vendors.as_ref())
                .run()
                .with_context(|| format!("parsing {acronym}"))?;
            print_parse_summary(acronym, &summary);
        }
    }

    if !unavailable.is_empty() {
        bail!("index unavailable for: {}", unavailable.join(", "));
    }
    Ok(())
}

fn load_department(path: &Path) -> anyhow::Result<Department> {
    DepartmentProfile::load(path)?
        .into_department()
        .with_context(|| format!("building department from {}", path.display()))
}

fn show(paths: &Paths, acronym: &str, stem: Option<&str>) -> anyhow::Result<()> {
    let records = RecordStore::new(paths, acronym);
    let Some(stem) = stem else {
        for stem in records.stems()? {
            println!("{stem}");
        }
        return Ok(());
    };
    let record = records
        .read(stem)?
        .with_context(|| format!("no record {stem} for {acronym}"))?;
    display::print_record_card(&record)
}

// ── Summaries ──

fn print_fetch_summary(acronym: &str, summary: &FetchSummary) {
    if !summary.dumped.is_empty() {
        for url in &summary.dumped {
            println!("{url}");
        }
        return;
    }
    println!("{acronym} fetch");
    println!("  {:<26} {}", "quarters fetched", summary.quarters_fetched);
    println!("  {:<26} {}", "contracts downloaded", summary.contracts_fetched);
    println!("  {:<26} {}", "already cached", summary.already_cached);
    println!("  {:<26} {}", "failed contracts", summary.failed_contracts);
    println!("  {:<26} {}", "failed quarter pages", summary.failed_quarter_pages);
    println!("  {:<26} {}", "sidecars written", summary.sidecars_written);
}

fn print_parse_summary(acronym: &str, summary: &ParseSummary) {
    println!("{acronym} parse");
    println!("  {:<26} {}", "files parsed", summary.files_parsed);
    println!("  {:<26} {}", "extraction failures", summary.extraction_failures);
    println!("  {:<26} {}", "normalization warnings", summary.warnings);
}
