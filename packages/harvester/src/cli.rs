//! Command-line interface for the harvester.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::bbox::check_bounds;
use crate::config::{parse_proxy, validate_page_size, HarvesterSettings};
use crate::csw::ElementSetName;
use crate::error::{Result, ValidationError};
use crate::harvester::{harvest_catalog_with_progress, HarvestOptions};
use crate::report::HarvestReport;
use crate::repository::{IngestRepository, YamlIngestRepository};
use crate::run::{CancellationFlag, HarvestRun, RunStatus};
use crate::transport::{Method, TransportConfig, XmlRequest};
use crate::types::Ingest;

/// Catalog Harvester - Harvest geospatial metadata from CSW catalogs.
#[derive(Parser)]
#[command(name = "catalog-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HttpMethod {
    Get,
    Post,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::Get,
            HttpMethod::Post => Method::Post,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Harvest records from a CSW endpoint.
    Harvest {
        /// CSW endpoint URL
        url: String,

        /// Element set: brief, summary or full (default: summary)
        #[arg(short, long)]
        element_set: Option<String>,

        /// Records per GetRecords page (default: HARVESTER_PAGE_SIZE or 50)
        #[arg(long)]
        page_size: Option<u32>,

        /// Stop after this many records
        #[arg(long)]
        max_records: Option<u64>,

        /// Wrap requests in a SOAP 1.2 envelope
        #[arg(long)]
        soap: bool,

        /// HTTP method for GetRecords
        #[arg(long, value_enum, default_value_t = HttpMethod::Post)]
        method: HttpMethod,

        /// Username for the catalog service
        #[arg(long)]
        user: Option<String>,

        /// Password for the catalog service
        #[arg(long, requires = "user")]
        password: Option<String>,

        /// Proxy as host:port
        #[arg(long)]
        proxy: Option<String>,

        /// Proxy username
        #[arg(long, requires = "proxy")]
        proxy_user: Option<String>,

        /// Proxy password
        #[arg(long, requires = "proxy_user")]
        proxy_password: Option<String>,

        /// Fields every record must carry (comma separated)
        #[arg(long = "require", value_delimiter = ',')]
        required_fields: Vec<String>,

        /// Job store directory; the run is appended to the job's history
        #[arg(long)]
        store: Option<PathBuf>,

        /// Job name in the store (default: the URL)
        #[arg(long, requires = "store")]
        name: Option<String>,

        /// Print the finished run as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether four coordinates form a valid bounding box.
    CheckBounds {
        #[arg(allow_negative_numbers = true)]
        min_x: String,
        #[arg(allow_negative_numbers = true)]
        min_y: String,
        #[arg(allow_negative_numbers = true)]
        max_x: String,
        #[arg(allow_negative_numbers = true)]
        max_y: String,
    },

    /// List stored harvest jobs.
    Jobs {
        /// Job store directory
        #[arg(long)]
        store: PathBuf,
    },
}

/// Arguments of the harvest command, after parsing.
struct HarvestArgs {
    url: String,
    element_set: Option<String>,
    page_size: Option<u32>,
    max_records: Option<u64>,
    soap: bool,
    method: HttpMethod,
    user: Option<String>,
    password: Option<String>,
    proxy: Option<String>,
    proxy_user: Option<String>,
    proxy_password: Option<String>,
    required_fields: Vec<String>,
    store: Option<PathBuf>,
    name: Option<String>,
    json: bool,
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Harvest {
            url,
            element_set,
            page_size,
            max_records,
            soap,
            method,
            user,
            password,
            proxy,
            proxy_user,
            proxy_password,
            required_fields,
            store,
            name,
            json,
        } => harvest_command(HarvestArgs {
            url,
            element_set,
            page_size,
            max_records,
            soap,
            method,
            user,
            password,
            proxy,
            proxy_user,
            proxy_password,
            required_fields,
            store,
            name,
            json,
        }),
        Commands::CheckBounds {
            min_x,
            min_y,
            max_x,
            max_y,
        } => check_bounds_command(&min_x, &min_y, &max_x, &max_y),
        Commands::Jobs { store } => jobs_command(&store),
    }
}

/// Execute the harvest command.
fn harvest_command(args: HarvestArgs) -> Result<()> {
    let settings = HarvesterSettings::from_env()?;

    // Validate inputs before making HTTP requests
    let element_set = ElementSetName::parse(args.element_set.as_deref())?;
    let page_size = validate_page_size(args.page_size.unwrap_or(settings.page_size))?;
    let required_fields: Vec<String> = args
        .required_fields
        .iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();

    let mut config = TransportConfig::from_settings(&settings);
    config.use_soap = args.soap;
    let mut client = XmlRequest::from_url(&args.url, config)?;

    if let Some(user) = &args.user {
        client.set_credentials(user.as_str(), args.password.clone().unwrap_or_default());
    }
    if let Some(proxy) = &args.proxy {
        let (host, port) = parse_proxy(proxy)?;
        client.set_proxy(host, port)?;
        if let Some(proxy_user) = &args.proxy_user {
            client.set_proxy_credentials(proxy_user, args.proxy_password.as_deref().unwrap_or(""))?;
        }
    }

    let options = HarvestOptions {
        element_set,
        method: args.method.into(),
        page_size,
        max_records: args.max_records,
        required_fields: required_fields.clone(),
    };

    if !args.json {
        println!(
            "{} {} ({} records per page)",
            style("Harvesting").bold(),
            style(&args.url).cyan(),
            page_size
        );
        println!();
    }

    // Create progress spinner
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Requesting records...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let cancel = CancellationFlag::new();
    let result = harvest_catalog_with_progress(&mut client, &options, &cancel, |progress| {
        pb.set_message(format!(
            "{} of {} records processed",
            progress.processed, progress.matched
        ));
    });
    pb.finish_and_clear();
    let run = result?;

    if let Some(store) = &args.store {
        let name = args.name.clone().unwrap_or_else(|| args.url.clone());
        let path = save_run(store, &name, &args.url, required_fields, &run)?;
        if !args.json {
            println!("{} {}", style("Saved to:").green().bold(), path.display());
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print_run(&run);
    }
    Ok(())
}

/// Append `run` to the history of job `name`, creating the job if needed.
fn save_run(
    store: &Path,
    name: &str,
    url: &str,
    required_fields: Vec<String>,
    run: &HarvestRun,
) -> Result<PathBuf> {
    let mut repo = YamlIngestRepository::open(store)?;
    let mut job = repo
        .find_by_name(name)?
        .unwrap_or_else(|| Ingest::new(name, url));
    for field in required_fields {
        job.add_required_field(field);
    }
    job.runs.push(run.clone());
    let saved = repo.save(job)?;
    Ok(repo
        .dir()
        .join(format!("ingest-{}.yaml", saved.id.unwrap_or_default())))
}

fn print_run(run: &HarvestRun) {
    let status = match run.status() {
        RunStatus::Succeeded => style(run.status().as_str()).green().bold(),
        RunStatus::Failed => style(run.status().as_str()).red().bold(),
        other => style(other.as_str()).yellow(),
    };
    println!("  Status: {status}");

    let Some(report) = run.report() else {
        return;
    };
    print_report(report);
}

fn print_report(report: &HarvestReport) {
    println!("  Public records: {}", report.public_records());
    println!("  Restricted records: {}", report.restricted_records());
    println!("  Raster records: {}", report.raster_records());
    println!("  Vector records: {}", report.vector_records());
    if report.web_service_warnings() > 0 {
        println!(
            "  Web service warnings: {}",
            style(report.web_service_warnings()).yellow().bold()
        );
    }
    if report.unrequired_field_warnings() > 0 {
        println!(
            "  Missing optional fields: {}",
            style(report.unrequired_field_warnings()).yellow()
        );
    }
    if !report.errors().is_empty() {
        println!("  Errors: {}", style(report.errors().len()).red().bold());
        for error in report.errors().iter().take(10) {
            println!("    {} {}", error.error_type, error.field);
        }
    }
}

/// Execute the check-bounds command.
fn check_bounds_command(min_x: &str, min_y: &str, max_x: &str, max_y: &str) -> Result<()> {
    match check_bounds(min_x, min_y, max_x, max_y) {
        Ok(bbox) => {
            println!(
                "{} {} {} {} {}",
                style("valid").green().bold(),
                bbox.min_x,
                bbox.min_y,
                bbox.max_x,
                bbox.max_y
            );
            Ok(())
        }
        Err(issue) => Err(ValidationError::from(issue).into()),
    }
}

/// Execute the jobs command.
fn jobs_command(store: &Path) -> Result<()> {
    let repo = YamlIngestRepository::open(store)?;
    let jobs = repo.find_all()?;

    if jobs.is_empty() {
        println!("No harvest jobs in {}", store.display());
        return Ok(());
    }

    for job in jobs {
        let last = job
            .last_run()
            .map(|run| run.status().as_str())
            .unwrap_or("never run");
        println!(
            "{:>4}  {}  {}  {}  {}",
            job.id.unwrap_or_default(),
            style(&job.name).cyan(),
            job.url,
            job.frequency,
            last
        );
    }
    Ok(())
}
