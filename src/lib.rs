//! An iterative DNS resolver
//!
//! Queries start at the root servers and follow referrals down the
//! delegation tree, fanning each query out to every nameserver of the
//! current zone over UDP, until some nameserver answers.

use log::debug;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

pub mod dns_parser;

mod cache;
mod fsm;
mod net;
mod zone;

pub use crate::cache::{Cache, CacheKey};
pub use crate::dns_parser::{
    Name, QueryClass, QueryType, Question, RRData, ResourceRecord, MAX_PACKET_SIZE,
};
pub use crate::fsm::MAX_REFERRALS;
pub use crate::zone::{Nameserver, Zone};

use crate::fsm::{QueryIds, FSM};

pub const DNS_PORT: u16 = 53;
pub const DEFAULT_RETRIES: u32 = 5;
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(2000);

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid domain name {0:?}: {1}")]
    InvalidName(String, #[source] dns_parser::Error),
    #[error("couldn't encode query: {0}")]
    Encode(#[source] dns_parser::Error),
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
    #[error("no response for {0}, retries exhausted")]
    RetriesExhausted(Question),
    #[error("too many referrals for {0}")]
    TooManyReferrals(Question),
    #[error("{0} does not exist")]
    NameError(Name),
    #[error("no records for {0}")]
    NoData(Question),
    #[error("resolution finished without an answer")]
    NoAnswer,
}

/// Tunables of a [`Resolver`]
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Zone every resolution starts from
    pub root: Zone,
    /// Port nameservers are queried on
    pub port: u16,
    /// Empty waits a zone is given before the resolution fails
    pub retries: u32,
    /// Bound on a single wait for responses
    pub wait_timeout: Duration,
    /// Sets RD on outgoing queries
    pub recursion_desired: bool,
}

impl Default for ResolverConfig {
    fn default() -> ResolverConfig {
        ResolverConfig {
            root: Zone::root(),
            port: DNS_PORT,
            retries: DEFAULT_RETRIES,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            recursion_desired: false,
        }
    }
}

pub struct Resolver {
    config: ResolverConfig,
    cache: Arc<Cache>,
    ids: QueryIds,
}

impl Default for Resolver {
    fn default() -> Resolver {
        Resolver::new()
    }
}

impl Resolver {
    pub fn new() -> Resolver {
        Resolver::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Resolver {
        Resolver::with_cache(config, Arc::new(Cache::new()))
    }

    /// Resolver answering from, and adding to, an existing cache
    pub fn with_cache(config: ResolverConfig, cache: Arc<Cache>) -> Resolver {
        Resolver {
            config,
            cache,
            ids: QueryIds::random(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    /// Resolves `name` iteratively, blocking until an answer or a failure
    ///
    /// Every answer seen along the way is cached, so repeated lookups
    /// are served without touching the network. Called from within a tokio
    /// runtime, the resolution runs on a thread of its own.
    pub fn resolve(
        &self,
        name: &str,
        qtype: QueryType,
        qclass: QueryClass,
    ) -> Result<ResourceRecord, ResolveError> {
        let qname: Name = name
            .parse()
            .map_err(|err| ResolveError::InvalidName(name.to_owned(), err))?;
        let question = Question::new(qname, qtype, qclass);
        debug!("resolving {}", question);

        let run = move || -> Result<ResourceRecord, ResolveError> {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let fsm = FSM::new(&self.config, &self.cache, &self.ids);
            runtime.block_on(fsm.resolve(question))
        };

        // a runtime can't be blocked on from inside another one
        if tokio::runtime::Handle::try_current().is_ok() {
            thread::scope(|scope| match scope.spawn(run).join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
        } else {
            run()
        }
    }
}
