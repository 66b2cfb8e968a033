use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vitrine_api::{AppContext, RestApi, ViewSettings};
use vitrine_core::{load_catalog, DuplicatePolicy, Error, ImageResolver, LoadOptions, ThumbnailSize};
use vitrine_storage::{
    FeedbackRecorder, FeedbackStore, FileFeedbackStore, RestFeedbackStore, RestStoreConfig,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DuplicateKeys {
    /// Keep the first row and log a warning
    Warn,
    /// Refuse to start the browsing page
    Reject,
}

impl From<DuplicateKeys> for DuplicatePolicy {
    fn from(value: DuplicateKeys) -> Self {
        match value {
            DuplicateKeys::Warn => DuplicatePolicy::Warn,
            DuplicateKeys::Reject => DuplicatePolicy::Reject,
        }
    }
}

/// Browse product similarity neighbours and collect ratings
#[derive(Parser, Debug)]
#[command(name = "vitrine")]
#[command(about = "Product similarity browser with a feedback form", long_about = None)]
struct Args {
    /// Similarity table (CSV)
    #[arg(long, env = "VITRINE_DATA_FILE", default_value = "./data/result_df.csv")]
    data_file: PathBuf,

    /// Image directories, searched in order
    #[arg(
        long = "image-dir",
        env = "VITRINE_IMAGE_DIRS",
        value_delimiter = ',',
        default_value = "./Files/file1,./Files/file2,./Files/file3"
    )]
    image_dirs: Vec<PathBuf>,

    /// Logo shown in the page header
    #[arg(long, default_value = "./logo.png")]
    logo: PathBuf,

    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// HTTP port
    #[arg(long, default_value_t = 8501)]
    http_port: u16,

    /// Used in the export file name
    #[arg(long, default_value = "products")]
    domain: String,

    /// Page title
    #[arg(long, default_value = "Similarity Detection for Fashion Retail Products")]
    title: String,

    #[arg(long, default_value_t = 400)]
    thumbnail_width: u32,

    #[arg(long, default_value_t = 600)]
    thumbnail_height: u32,

    /// What to do when image_name is not unique
    #[arg(long, value_enum, default_value_t = DuplicateKeys::Warn)]
    duplicate_keys: DuplicateKeys,

    /// Base URL of the hosted feedback table
    #[arg(long, env = "FEEDBACK_STORE_URL")]
    feedback_url: Option<String>,

    /// API key for the hosted feedback table
    #[arg(long, env = "FEEDBACK_STORE_KEY", hide_env_values = true)]
    feedback_key: Option<String>,

    #[arg(long, default_value = "feedback")]
    feedback_table: String,

    /// Local feedback file, used when no URL is configured
    #[arg(long, default_value = "./data/feedback.jsonl")]
    feedback_file: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn feedback_store(args: &Args) -> vitrine_core::Result<Arc<dyn FeedbackStore>> {
    match (&args.feedback_url, &args.feedback_key) {
        (Some(url), Some(key)) => {
            info!("Feedback store: {}/rest/v1/{}", url.trim_end_matches('/'), args.feedback_table);
            let store = RestFeedbackStore::new(RestStoreConfig {
                url: url.clone(),
                api_key: key.clone(),
                table: args.feedback_table.clone(),
            })?;
            Ok(Arc::new(store))
        }
        (Some(_), None) => Err(Error::InvalidConfig(
            "FEEDBACK_STORE_URL is set but FEEDBACK_STORE_KEY is missing".to_string(),
        )),
        (None, _) => {
            info!("Feedback store: {:?}", args.feedback_file);
            Ok(Arc::new(FileFeedbackStore::open(&args.feedback_file)?))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Vitrine v{}", env!("CARGO_PKG_VERSION"));
    info!("Data file: {:?}", args.data_file);
    info!("Image directories: {:?}", args.image_dirs);
    info!("HTTP port: {}", args.http_port);

    let store = feedback_store(&args)?;
    let recorder = FeedbackRecorder::new(store, args.domain.clone());
    info!("Feedback backend: {}", recorder.backend());

    let options = LoadOptions {
        duplicates: args.duplicate_keys.into(),
    };
    let catalog = load_catalog(&args.data_file, options);
    if let Ok(c) = &catalog {
        if !c.warnings().is_empty() {
            warn!("Catalog loaded with {} warning(s)", c.warnings().len());
        }
    }

    let settings = ViewSettings {
        title: args.title.clone(),
        logo: Some(args.logo.clone()),
        thumbnail: ThumbnailSize {
            width: args.thumbnail_width,
            height: args.thumbnail_height,
        },
        ..ViewSettings::default()
    };
    let ctx = Arc::new(AppContext::new(
        catalog,
        ImageResolver::new(args.image_dirs.clone()),
        recorder,
        settings,
    ));

    let host = args.host.clone();
    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on {}:{}", host, http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(ctx, &host, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("Vitrine started successfully");
    info!("Open http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
