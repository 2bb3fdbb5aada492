//! Command Line Interface (CLI) arguments.

use crate::envelope::DEFAULT_TOP_REGIONS;
use crate::models::Compression;

use clap::builder::RangedU64ValueParser;
use clap::Parser;
use url::Url;

/// Sales analytics command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "SALES_ANALYTICS_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 8080, env = "SALES_ANALYTICS_PORT")]
    pub port: u16,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "SALES_ANALYTICS_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/sales-analytics/certs/cert.pem",
        env = "SALES_ANALYTICS_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/sales-analytics/certs/key.pem",
        env = "SALES_ANALYTICS_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "SALES_ANALYTICS_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Whether to enable sending traces to Jaeger.
    #[arg(long, default_value_t = false, env = "SALES_ANALYTICS_ENABLE_JAEGER")]
    pub enable_jaeger: bool,
    /// Whether to use Rayon for parsing and aggregating datasets.
    #[arg(long, default_value_t = false, env = "SALES_ANALYTICS_USE_RAYON")]
    pub use_rayon: bool,
    /// URL of the object store holding the default dataset
    #[arg(long, env = "SALES_ANALYTICS_SOURCE", requires_all = ["bucket", "object"])]
    pub source: Option<Url>,
    /// Bucket of the default dataset
    #[arg(long, env = "SALES_ANALYTICS_BUCKET")]
    pub bucket: Option<String>,
    /// Object key of the default dataset
    #[arg(long, env = "SALES_ANALYTICS_OBJECT")]
    pub object: Option<String>,
    /// Compression of the default dataset
    #[arg(long, value_enum, env = "SALES_ANALYTICS_COMPRESSION")]
    pub compression: Option<Compression>,
    /// S3 access key used when a request carries no credentials
    #[arg(long, env = "SALES_ANALYTICS_ACCESS_KEY", requires = "secret_key")]
    pub access_key: Option<String>,
    /// S3 secret key used when a request carries no credentials
    #[arg(long, env = "SALES_ANALYTICS_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,
    /// Number of regions in the regional analytics, unless a request asks otherwise
    #[arg(
        long,
        default_value_t = DEFAULT_TOP_REGIONS,
        env = "SALES_ANALYTICS_TOP_REGIONS",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub top_regions: usize,
    /// Interval in seconds between scheduled runs over the default dataset. Disabled if unset or
    /// zero.
    #[arg(long, env = "SALES_ANALYTICS_SCHEDULE_INTERVAL")]
    pub schedule_interval: Option<u64>,
    /// Object key to which scheduled runs publish the result, in the default dataset's bucket
    #[arg(long, env = "SALES_ANALYTICS_PUBLISH_KEY")]
    pub publish_key: Option<String>,
    /// Maximum number of simultaneous outbound S3 connections
    #[arg(long, env = "SALES_ANALYTICS_S3_CONNECTION_LIMIT")]
    pub s3_connection_limit: Option<usize>,
    /// Memory limit in bytes for buffered datasets
    #[arg(long, env = "SALES_ANALYTICS_MEMORY_LIMIT")]
    pub memory_limit: Option<usize>,
    /// Maximum number of datasets parsed and aggregated at once. Defaults to the number of CPUs
    /// minus one.
    #[arg(long, env = "SALES_ANALYTICS_THREAD_LIMIT")]
    pub thread_limit: Option<usize>,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
