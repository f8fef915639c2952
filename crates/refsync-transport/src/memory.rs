//! In-memory transport for testing and ephemeral use.
//!
//! [`InMemoryTransport`] connects two in-memory [`Repository`] values, a
//! local one and a remote one, and implements the full [`Transport`]
//! contract between them. Failures can be injected at every collaborator
//! step with [`FailurePoint`], and every call is recorded in a journal so
//! tests can check cleanup ordering.

use std::collections::{BTreeMap, HashMap, HashSet};

use refsync_refspec::RefspecPattern;
use refsync_types::{Direction, Oid};
use tracing::debug;

use crate::error::{TransportError, TransportResult};
use crate::negotiation::NegotiationEngine;
use crate::traits::{PushSessionHandle, StatusStream, Transport};
use crate::types::{AdvertisedRef, RefStatus, TipUpdate, TransferStats};

/// A stored object: its parents and its size on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRecord {
    pub parents: Vec<Oid>,
    pub size: u64,
}

/// A minimal repository: a commit graph plus a reference map.
#[derive(Clone, Debug, Default)]
pub struct Repository {
    objects: HashMap<Oid, ObjectRecord>,
    refs: BTreeMap<String, Oid>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a commit with the given content and parents, returning its id.
    pub fn commit(&mut self, content: &[u8], parents: &[Oid]) -> Oid {
        let mut bytes = content.to_vec();
        for parent in parents {
            bytes.extend_from_slice(parent.as_bytes());
        }
        let oid = Oid::from_bytes(&bytes);
        self.objects.insert(
            oid,
            ObjectRecord {
                parents: parents.to_vec(),
                size: bytes.len() as u64,
            },
        );
        oid
    }

    pub fn set_ref(&mut self, name: impl Into<String>, target: Oid) {
        self.refs.insert(name.into(), target);
    }

    pub fn remove_ref(&mut self, name: &str) -> Option<Oid> {
        self.refs.remove(name)
    }

    pub fn ref_target(&self, name: &str) -> Option<Oid> {
        self.refs.get(name).copied()
    }

    pub fn refs(&self) -> &BTreeMap<String, Oid> {
        &self.refs
    }

    pub fn contains(&self, oid: &Oid) -> bool {
        self.objects.contains_key(oid)
    }

    pub fn object(&self, oid: &Oid) -> Option<&ObjectRecord> {
        self.objects.get(oid)
    }

    /// Returns `true` if `ancestor` is reachable from `descendant`
    /// (an object counts as its own ancestor).
    pub fn is_descendant(&self, descendant: Oid, ancestor: Oid) -> bool {
        let mut stack = vec![descendant];
        let mut seen = HashSet::new();
        while let Some(oid) = stack.pop() {
            if oid == ancestor {
                return true;
            }
            if !seen.insert(oid) {
                continue;
            }
            if let Some(record) = self.objects.get(&oid) {
                stack.extend(record.parents.iter().copied());
            }
        }
        false
    }

    /// Copy everything reachable from `tips` in `source` that this
    /// repository lacks. Returns the copied ids and their total size.
    pub fn import(&mut self, source: &Repository, tips: &[Oid]) -> (Vec<Oid>, u64) {
        let wants = NegotiationEngine::compute_wants(source, tips, self);
        let mut bytes = 0;
        for oid in &wants {
            if let Some(record) = source.object(oid) {
                bytes += record.size;
                self.objects.insert(*oid, record.clone());
            }
        }
        (wants, bytes)
    }
}

/// A collaborator step at which [`InMemoryTransport`] can be told to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Connect,
    Download,
    Disconnect,
    UpdateLocalTips,
    OpenPush,
    AddRefspec,
    Finish,
    Unpack,
    Status,
    UpdateRemoteTips,
}

/// One entry in the transport's call journal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Connect(Direction),
    Download,
    Disconnect,
    UpdateLocalTips(usize),
    OpenPush,
    AddRefspec(String),
    Finish,
    Statuses,
    UpdateRemoteTips,
    ClosePush,
}

/// A transport between two in-memory repositories.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    local: Repository,
    remote: Repository,
    connection: Option<Direction>,
    stats: TransferStats,
    fetched: Vec<AdvertisedRef>,
    failures: HashSet<FailurePoint>,
    rejections: BTreeMap<String, String>,
    journal: Vec<Call>,
}

impl InMemoryTransport {
    pub fn new(local: Repository, remote: Repository) -> Self {
        Self {
            local,
            remote,
            ..Self::default()
        }
    }

    pub fn local(&self) -> &Repository {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut Repository {
        &mut self.local
    }

    pub fn remote(&self) -> &Repository {
        &self.remote
    }

    /// Make the given step fail from now on.
    pub fn fail_at(&mut self, point: FailurePoint) {
        self.failures.insert(point);
    }

    /// Have the remote refuse pushes to `reference` with `message`.
    pub fn reject_push(&mut self, reference: impl Into<String>, message: impl Into<String>) {
        self.rejections.insert(reference.into(), message.into());
    }

    pub fn journal(&self) -> &[Call] {
        &self.journal
    }

    /// How many times `call` appears in the journal.
    pub fn count(&self, call: &Call) -> usize {
        self.journal.iter().filter(|c| *c == call).count()
    }

    pub fn connection(&self) -> Option<Direction> {
        self.connection
    }

    fn injected(&self, point: FailurePoint) -> bool {
        self.failures.contains(&point)
    }

    fn require(&self, direction: Direction) -> TransportResult<()> {
        match self.connection {
            Some(active) if active == direction => Ok(()),
            _ => Err(TransportError::NotConnected(direction)),
        }
    }
}

impl Transport for InMemoryTransport {
    fn connect(&mut self, direction: Direction) -> TransportResult<()> {
        self.journal.push(Call::Connect(direction));
        if let Some(active) = self.connection {
            return Err(TransportError::AlreadyConnected(active));
        }
        if self.injected(FailurePoint::Connect) {
            return Err(TransportError::Connect("remote unreachable".into()));
        }
        self.connection = Some(direction);
        Ok(())
    }

    fn download(&mut self) -> TransportResult<()> {
        self.journal.push(Call::Download);
        self.require(Direction::Fetch)?;
        if self.injected(FailurePoint::Download) {
            return Err(TransportError::Download("connection reset during pack transfer".into()));
        }

        let tips: Vec<Oid> = self.remote.refs().values().copied().collect();
        let (received, bytes) = self.local.import(&self.remote, &tips);
        self.stats = TransferStats {
            indexed_objects: received.len() as u64,
            received_objects: received.len() as u64,
            received_bytes: bytes,
        };
        self.fetched = self
            .remote
            .refs()
            .iter()
            .map(|(name, target)| AdvertisedRef {
                name: name.clone(),
                target: *target,
            })
            .collect();
        debug!(objects = received.len(), bytes, "downloaded objects");
        Ok(())
    }

    fn disconnect(&mut self) -> TransportResult<()> {
        self.journal.push(Call::Disconnect);
        self.connection = None;
        if self.injected(FailurePoint::Disconnect) {
            return Err(TransportError::Connect("error closing connection".into()));
        }
        Ok(())
    }

    fn stats(&self) -> TransferStats {
        self.stats
    }

    fn fetched_refs(&self) -> TransportResult<Vec<AdvertisedRef>> {
        Ok(self.fetched.clone())
    }

    fn update_local_tips(&mut self, updates: &[TipUpdate]) -> TransportResult<()> {
        self.journal.push(Call::UpdateLocalTips(updates.len()));
        self.require(Direction::Fetch)?;
        if self.injected(FailurePoint::UpdateLocalTips) {
            return Err(TransportError::Remote("could not lock local refs".into()));
        }

        // Validate every update before applying any of them.
        for update in updates {
            if !self.local.contains(&update.target) {
                return Err(TransportError::MissingObject(update.target));
            }
            if let Some(current) = self.local.ref_target(&update.name) {
                if !update.force && !self.local.is_descendant(update.target, current) {
                    return Err(TransportError::NonFastForward {
                        name: update.name.clone(),
                    });
                }
            }
        }
        for update in updates {
            self.local.set_ref(update.name.clone(), update.target);
        }
        Ok(())
    }

    fn open_push_session(&mut self) -> TransportResult<Box<dyn PushSessionHandle + '_>> {
        self.journal.push(Call::OpenPush);
        self.require(Direction::Push)?;
        if self.injected(FailurePoint::OpenPush) {
            return Err(TransportError::Remote("remote does not accept pushes".into()));
        }
        Ok(Box::new(MemoryPushSession {
            transport: self,
            pending: Vec::new(),
            report: Vec::new(),
            accepted: Vec::new(),
            finished: false,
        }))
    }
}

/// One registered destination of a push.
#[derive(Clone, Debug)]
struct PendingPush {
    remote_name: String,
    /// `None` deletes the remote reference.
    target: Option<Oid>,
    force: bool,
}

/// A push session over an [`InMemoryTransport`].
struct MemoryPushSession<'a> {
    transport: &'a mut InMemoryTransport,
    pending: Vec<PendingPush>,
    report: Vec<RefStatus>,
    accepted: Vec<PendingPush>,
    finished: bool,
}

impl MemoryPushSession<'_> {
    fn verdict(&self, push: &PendingPush) -> Option<String> {
        let remote = &self.transport.remote;
        if let Some(message) = self.transport.rejections.get(&push.remote_name) {
            return Some(message.clone());
        }
        let (Some(target), Some(current)) = (push.target, remote.ref_target(&push.remote_name)) else {
            return None;
        };
        if push.force || current == target {
            return None;
        }
        // The remote cannot prove ancestry for history it never received.
        if !self.transport.local.is_descendant(target, current) {
            return Some("non-fast-forward".into());
        }
        None
    }
}

impl PushSessionHandle for MemoryPushSession<'_> {
    fn add_refspec(&mut self, refspec: &str) -> TransportResult<()> {
        self.transport.journal.push(Call::AddRefspec(refspec.to_string()));
        if self.transport.injected(FailurePoint::AddRefspec) {
            return Err(TransportError::Remote("push session rejected refspec".into()));
        }
        let spec = RefspecPattern::push(refspec).map_err(|err| TransportError::InvalidRefspec {
            refspec: refspec.to_string(),
            reason: err.to_string(),
        })?;

        if spec.is_deletion() {
            self.pending.push(PendingPush {
                remote_name: spec.destination().to_string(),
                target: None,
                force: spec.is_forced(),
            });
            return Ok(());
        }

        let mut matched = 0;
        for (name, target) in self.transport.local.refs() {
            if !spec.matches_source(name) {
                continue;
            }
            let remote_name = spec.transform(name).map_err(|err| TransportError::InvalidRefspec {
                refspec: refspec.to_string(),
                reason: err.to_string(),
            })?;
            self.pending.push(PendingPush {
                remote_name,
                target: Some(*target),
                force: spec.is_forced(),
            });
            matched += 1;
        }
        if matched == 0 {
            return Err(TransportError::InvalidRefspec {
                refspec: refspec.to_string(),
                reason: format!("src refspec {} does not match any local ref", spec.source()),
            });
        }
        Ok(())
    }

    fn finish(&mut self) -> TransportResult<()> {
        self.transport.journal.push(Call::Finish);
        if self.transport.injected(FailurePoint::Finish) {
            return Err(TransportError::Negotiation("remote hung up during negotiation".into()));
        }

        let mut report = Vec::with_capacity(self.pending.len());
        let mut accepted = Vec::new();
        for push in &self.pending {
            match self.verdict(push) {
                Some(message) => report.push(RefStatus::rejected(&push.remote_name, message)),
                None => {
                    report.push(RefStatus::accepted(&push.remote_name));
                    accepted.push(push.clone());
                }
            }
        }

        let tips: Vec<Oid> = accepted.iter().filter_map(|p| p.target).collect();
        let transport = &mut *self.transport;
        let (sent, bytes) = transport.remote.import(&transport.local, &tips);
        debug!(objects = sent.len(), bytes, "sent pack");

        self.report = report;
        self.accepted = accepted;
        self.finished = true;
        Ok(())
    }

    fn unpack_ok(&self) -> bool {
        self.finished && !self.transport.injected(FailurePoint::Unpack)
    }

    fn statuses(&mut self) -> StatusStream<'_> {
        self.transport.journal.push(Call::Statuses);
        let broken = self
            .transport
            .injected(FailurePoint::Status)
            .then(|| Err(TransportError::Status("malformed report-status line".into())));
        Box::new(self.report.iter().cloned().map(Ok).chain(broken))
    }

    fn update_remote_tips(&mut self) -> TransportResult<()> {
        self.transport.journal.push(Call::UpdateRemoteTips);
        if self.transport.injected(FailurePoint::UpdateRemoteTips) {
            return Err(TransportError::Remote("could not update remote refs".into()));
        }
        for push in &self.accepted {
            match push.target {
                Some(target) => self.transport.remote.set_ref(push.remote_name.clone(), target),
                None => {
                    self.transport.remote.remove_ref(&push.remote_name);
                }
            }
        }
        Ok(())
    }
}

impl Drop for MemoryPushSession<'_> {
    fn drop(&mut self) {
        self.transport.journal.push(Call::ClosePush);
    }
}
