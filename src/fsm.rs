use crate::cache::{Cache, CacheKey};
use crate::dns_parser::{Message, QueryOptions, QueryType, Question, ResourceRecord, ResponseCode};
use crate::net::{Exchange, Response};
use crate::zone::Zone;
use crate::{ResolveError, ResolverConfig};
use log::{debug, trace, warn};
use std::sync::atomic::{AtomicU16, Ordering};
use tokio::time::{timeout_at, Instant};

/// Referrals a single query may follow before it is given up
pub const MAX_REFERRALS: usize = 32;

/// Transaction IDs for outgoing queries, wrapping after 65535
#[derive(Debug)]
pub struct QueryIds(AtomicU16);

impl QueryIds {
    pub fn starting_at(id: u16) -> QueryIds {
        QueryIds(AtomicU16::new(id))
    }

    pub fn random() -> QueryIds {
        QueryIds::starting_at(rand::random())
    }

    pub fn next(&self) -> u16 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// A frame of the work stack: one question being chased through zones
pub struct ActiveQuery {
    question: Question,
    zone: Zone,
    retries: u32,
    referrals: usize,
    /// ID of the query sent to `pending`
    id: u16,
    pending: Option<Exchange>,
    /// End of the current wait cycle, kept across noise
    deadline: Option<Instant>,
}

impl ActiveQuery {
    pub fn new(question: Question, zone: Zone, retries: u32) -> ActiveQuery {
        ActiveQuery {
            question,
            zone,
            retries: retries.max(1),
            referrals: 0,
            id: 0,
            pending: None,
            deadline: None,
        }
    }

    /// Moves on to `zone`, closing every socket of the previous one
    fn rezone(&mut self, zone: Zone, retries: u32) -> Result<(), ResolveError> {
        self.pending = None;
        self.referrals += 1;
        if self.referrals > MAX_REFERRALS {
            return Err(ResolveError::TooManyReferrals(self.question.clone()));
        }
        self.zone = zone;
        self.retries = retries.max(1);
        Ok(())
    }

    fn consume_retry(&mut self) -> Result<(), ResolveError> {
        self.deadline = None;
        self.retries = self.retries.saturating_sub(1);
        if self.retries == 0 {
            return Err(ResolveError::RetriesExhausted(self.question.clone()));
        }
        Ok(())
    }
}

/// What a response means for the query that provoked it
#[derive(Debug, PartialEq)]
enum Outcome {
    Answer(ResourceRecord),
    Referral(Zone),
    /// A referral without any glue to follow
    DeadEnd,
    NameError,
    NoData,
}

/// Returns `None` for responses that carry nothing usable
fn classify(message: &Message, question: &Question) -> Option<Outcome> {
    if message.header.response_code == ResponseCode::NameError && message.answers.is_empty() {
        return Some(Outcome::NameError);
    }

    if message.is_referral() {
        let delegates = message
            .nameservers
            .iter()
            .any(|rr| rr.typ() == QueryType::NS);
        if !delegates && message.header.authoritative {
            return Some(Outcome::NoData);
        }

        let zone = Zone::from_referral(message);
        if zone.is_empty() {
            return Some(Outcome::DeadEnd);
        }
        return Some(Outcome::Referral(zone));
    }

    message
        .answers
        .iter()
        .find(|rr| rr.answers(question))
        .or_else(|| message.answers.first())
        .map(|rr| Outcome::Answer(rr.clone()))
}

enum Step {
    Satisfied(ResourceRecord),
    Waiting,
}

/// Drives resolutions to completion
pub struct FSM<'a> {
    config: &'a ResolverConfig,
    cache: &'a Cache,
    ids: &'a QueryIds,
}

impl<'a> FSM<'a> {
    pub fn new(config: &'a ResolverConfig, cache: &'a Cache, ids: &'a QueryIds) -> FSM<'a> {
        FSM { config, cache, ids }
    }

    /// Walks down from the configured root zone until `question` is answered
    pub async fn resolve(&self, question: Question) -> Result<ResourceRecord, ResolveError> {
        let frame = ActiveQuery::new(question, self.config.root.clone(), self.config.retries);
        self.drive(vec![frame]).await
    }

    /// Works the stack until its bottom frame is answered or a frame fails
    pub async fn drive(&self, mut stack: Vec<ActiveQuery>) -> Result<ResourceRecord, ResolveError> {
        loop {
            let depth = stack.len();
            let frame = match stack.last_mut() {
                Some(frame) => frame,
                None => return Err(ResolveError::NoAnswer),
            };

            if let Some(record) = self.cache.lookup(&CacheKey::from(&frame.question)) {
                debug!("cache hit for {}", frame.question);
                if depth == 1 {
                    return Ok(record);
                }
                stack.pop();
                continue;
            }

            if frame.pending.is_none() {
                self.dispatch(frame).await?;
            }

            match self.wait(frame).await? {
                Step::Satisfied(record) => {
                    debug!("answered {}: {}", frame.question, record);
                    if depth == 1 {
                        return Ok(record);
                    }
                    stack.pop();
                }
                Step::Waiting => (),
            }
        }
    }

    async fn dispatch(&self, frame: &mut ActiveQuery) -> Result<(), ResolveError> {
        frame.pending = None;
        frame.deadline = None;
        frame.id = self.ids.next();

        let options = QueryOptions {
            id: frame.id,
            recursion_desired: self.config.recursion_desired,
            ..QueryOptions::default()
        };
        let packet = Message::query(options, vec![frame.question.clone()])
            .write()
            .map_err(ResolveError::Encode)?;

        debug!(
            "asking {} nameservers about {} (id {})",
            frame.zone.len(),
            frame.question,
            frame.id
        );
        let exchange = Exchange::dispatch(&frame.zone, self.config.port, &packet).await?;
        frame.pending = Some(exchange);
        Ok(())
    }

    /// One bounded wait on the frame's outstanding queries
    ///
    /// Batches that only carry noise leave the cycle's deadline as it was.
    async fn wait(&self, frame: &mut ActiveQuery) -> Result<Step, ResolveError> {
        let wait_timeout = self.config.wait_timeout;
        let deadline = *frame
            .deadline
            .get_or_insert_with(|| Instant::now() + wait_timeout);
        let exchange = match frame.pending.as_mut() {
            Some(exchange) => exchange,
            None => return Ok(Step::Waiting),
        };

        let responses = match timeout_at(deadline, exchange.recv_ready()).await {
            Ok(responses) => responses?,
            Err(_) => {
                warn!(
                    "timed out waiting on {} nameservers for {}, {} retries left",
                    exchange.len(),
                    frame.question,
                    frame.retries - 1
                );
                frame.consume_retry()?;
                return Ok(Step::Waiting);
            }
        };

        self.settle(frame, responses)
    }

    /// Applies a batch of responses to `frame`
    ///
    /// The first usable response decides; the rest are only cached. A
    /// dead end counts against the retries only if nothing else in the
    /// batch was usable.
    fn settle(
        &self,
        frame: &mut ActiveQuery,
        responses: Vec<Response>,
    ) -> Result<Step, ResolveError> {
        let mut outcome = None;
        let mut dead_end = false;
        for response in responses {
            let message = match Message::parse(&response.data) {
                Ok(message) => message,
                Err(error) => {
                    warn!("couldn't parse response from {}: {}", response.from, error);
                    continue;
                }
            };

            if message.header.query || message.header.id != frame.id {
                warn!(
                    "ignoring packet from {} with id {}, expected a response to {}",
                    response.from, message.header.id, frame.id
                );
                continue;
            }
            if message.header.truncated {
                warn!("response from {} is truncated", response.from);
            }

            for record in &message.answers {
                self.cache.insert(record.clone());
            }

            if outcome.is_some() {
                continue;
            }
            match classify(&message, &frame.question) {
                Some(Outcome::DeadEnd) => {
                    debug!("referral from {} has no usable glue", response.from);
                    dead_end = true;
                }
                Some(found) => outcome = Some(found),
                None => trace!("nothing usable from {}", response.from),
            }
        }

        match outcome {
            None if dead_end => {
                warn!("no referral for {} has usable glue", frame.question);
                frame.consume_retry()?;
                Ok(Step::Waiting)
            }
            None | Some(Outcome::DeadEnd) => Ok(Step::Waiting),
            Some(Outcome::Answer(record)) => Ok(Step::Satisfied(record)),
            Some(Outcome::Referral(zone)) => {
                debug!(
                    "referred to {} for {}",
                    zone.iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                    frame.question
                );
                frame.rezone(zone, self.config.retries)?;
                Ok(Step::Waiting)
            }
            Some(Outcome::NameError) => Err(ResolveError::NameError(frame.question.qname.clone())),
            Some(Outcome::NoData) => Err(ResolveError::NoData(frame.question.clone())),
        }
    }
}
