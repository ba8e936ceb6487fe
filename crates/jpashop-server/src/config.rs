//! Server configuration.

use clap::Parser;
use jpashop_core::{CollectionPaging, LoadBudget};
use jpashop_proto::{OrderSearch, OrderStatus, Pagination, DEFAULT_PAGE_LIMIT};
use std::path::PathBuf;

use crate::error::Error;
use crate::handler::Endpoint;

/// Default data directory.
pub const DEFAULT_DATA_PATH: &str = "./jpashop_data";

/// Default cap on root orders per query.
pub const DEFAULT_MAX_RESULTS: usize = 1000;

/// Default number of order ids per batched child query.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// jpashop server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the database storage directory.
    pub data_path: PathBuf,

    /// Use a throwaway database instead of `data_path`.
    pub temporary: bool,

    /// Limits and policies for order loading.
    pub budget: LoadBudget,

    /// Insert the demo data set into an empty database.
    pub seed: bool,

    /// Endpoints to serve, in order.
    pub endpoints: Vec<Endpoint>,

    /// Search criteria passed to every endpoint.
    pub search: OrderSearch,

    /// Requested window. None means unpaginated, except for endpoints that
    /// always page.
    pub pagination: Option<Pagination>,
}

impl ServerConfig {
    /// Create a new server configuration with the given data path.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            temporary: false,
            budget: LoadBudget::default(),
            seed: true,
            endpoints: Endpoint::ALL.to_vec(),
            search: OrderSearch::all(),
            pagination: None,
        }
    }

    /// Use a temporary database.
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    /// Set the load budget.
    pub fn with_budget(mut self, budget: LoadBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Skip the demo data set.
    pub fn without_seed(mut self) -> Self {
        self.seed = false;
        self
    }

    /// Serve only the given endpoints.
    pub fn with_endpoints(mut self, endpoints: Vec<Endpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set the search criteria.
    pub fn with_search(mut self, search: OrderSearch) -> Self {
        self.search = search;
        self
    }

    /// Set the requested window.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_PATH)
    }
}

/// Command-line arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "jpashop-server")]
#[command(version, about = "jpashop order query server", long_about = None)]
pub struct Args {
    /// Path to the database storage directory.
    #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,

    /// Use a temporary database that is discarded on exit.
    #[arg(long)]
    pub temporary: bool,

    /// Maximum root orders returned by any single query.
    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: usize,

    /// Maximum order ids per batched child query.
    #[arg(long, default_value_t = DEFAULT_MAX_BATCH_SIZE)]
    pub max_batch_size: usize,

    /// Paginate collection-joining strategies in memory instead of rejecting
    /// the window.
    #[arg(long)]
    pub in_memory_collection_paging: bool,

    /// Do not insert the demo data set.
    #[arg(long)]
    pub no_seed: bool,

    /// Endpoint to serve (repeatable). Serves all endpoints when omitted.
    #[arg(short, long = "endpoint")]
    pub endpoints: Vec<String>,

    /// Filter by order status (ORDER or CANCEL).
    #[arg(long)]
    pub status: Option<String>,

    /// Filter by a substring of the buyer's name.
    #[arg(long)]
    pub name: Option<String>,

    /// Number of orders to skip.
    #[arg(long)]
    pub offset: Option<u32>,

    /// Maximum number of orders per page.
    #[arg(long)]
    pub limit: Option<u32>,
}

impl Args {
    /// Convert command-line arguments to server configuration.
    pub fn into_config(self) -> Result<ServerConfig, Error> {
        let collection_paging = if self.in_memory_collection_paging {
            CollectionPaging::InMemory
        } else {
            CollectionPaging::Reject
        };
        let budget = LoadBudget::new(self.max_results, self.max_batch_size, collection_paging);

        let endpoints = if self.endpoints.is_empty() {
            Endpoint::ALL.to_vec()
        } else {
            self.endpoints
                .iter()
                .map(|name| {
                    Endpoint::parse(name)
                        .ok_or_else(|| Error::Config(format!("unknown endpoint: {name}")))
                })
                .collect::<Result<Vec<_>, Error>>()?
        };

        let mut search = OrderSearch::all();
        if let Some(status) = &self.status {
            let status = OrderStatus::parse(status)
                .ok_or_else(|| Error::Config(format!("unknown order status: {status}")))?;
            search = search.with_status(status);
        }
        if let Some(name) = self.name {
            search = search.with_member_name(name);
        }

        let pagination = match (self.offset, self.limit) {
            (None, None) => None,
            (offset, limit) => Some(Pagination::new(
                limit.unwrap_or(DEFAULT_PAGE_LIMIT),
                offset.unwrap_or(0),
            )),
        };

        Ok(ServerConfig {
            data_path: self.data_path,
            temporary: self.temporary,
            budget,
            seed: !self.no_seed,
            endpoints,
            search,
            pagination,
        })
    }
}
