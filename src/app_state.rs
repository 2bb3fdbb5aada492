use crate::cli::CommandLineArgs;
use crate::clock::{Clock, SystemClock};
use crate::models::RequestData;
use crate::resource_manager::ResourceManager;
use crate::s3_client::S3ClientMap;

use std::sync::Arc;

/// Shared application state passed to each request handler and to the scheduler.
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Resource manager.
    pub resource_manager: ResourceManager,

    /// Map of S3 client objects.
    pub s3_client_map: S3ClientMap,

    /// Source of result envelope timestamps.
    pub clock: Arc<dyn Clock>,

    /// The dataset configured on the command line, if any.
    pub default_request: Option<RequestData>,
}

impl AppState {
    /// Create and return an [AppState].
    pub fn new(args: &CommandLineArgs) -> Self {
        let task_limit = args
            .thread_limit
            .or_else(|| Some(num_cpus::get().saturating_sub(1).max(1)));
        let resource_manager =
            ResourceManager::new(args.s3_connection_limit, args.memory_limit, task_limit);

        Self {
            args: args.clone(),
            resource_manager,
            s3_client_map: S3ClientMap::new(),
            clock: Arc::new(SystemClock),
            default_request: default_request(args),
        }
    }

    /// Return the state with a different clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Build the request data of the default dataset from the command line arguments.
fn default_request(args: &CommandLineArgs) -> Option<RequestData> {
    match (&args.source, &args.bucket, &args.object) {
        (Some(source), Some(bucket), Some(object)) => Some(RequestData {
            source: source.clone(),
            bucket: bucket.clone(),
            object: object.clone(),
            compression: args.compression,
            top_regions: None,
        }),
        _ => None,
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
