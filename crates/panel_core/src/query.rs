use crate::{QueryAnswer, StreamEvent};

pub type SessionId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Answered(QueryAnswer),
    Failed(String),
}

/// What a stream event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Applied {
    Ignored,
    Progress,
    Answered,
    Failed(String),
}

/// One submitted query and everything the stream has told us about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySession {
    pub id: SessionId,
    pub query: String,
    pub online_search: bool,
    pub progress: Vec<String>,
    pub outcome: Option<QueryOutcome>,
}

impl QuerySession {
    pub(crate) fn new(id: SessionId, query: String, online_search: bool) -> Self {
        Self {
            id,
            query,
            online_search,
            progress: Vec::new(),
            outcome: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Applies one event. Nothing is applied after a terminal event.
    pub(crate) fn apply(&mut self, event: StreamEvent) -> Applied {
        if self.is_terminal() {
            return Applied::Ignored;
        }
        match event {
            StreamEvent::Progress { message } => {
                self.progress.push(message);
                Applied::Progress
            }
            StreamEvent::Final(answer) => {
                // Progress and result are mutually exclusive views.
                self.progress.clear();
                self.outcome = Some(QueryOutcome::Answered(answer));
                Applied::Answered
            }
            StreamEvent::Error { message } => {
                self.outcome = Some(QueryOutcome::Failed(message.clone()));
                Applied::Failed(message)
            }
        }
    }
}

/// Owner of the single active query session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryController {
    last_id: SessionId,
    session: Option<QuerySession>,
}

impl QueryController {
    pub fn session(&self) -> Option<&QuerySession> {
        self.session.as_ref()
    }

    /// The id of a session still waiting for its terminal event.
    pub fn in_flight(&self) -> Option<SessionId> {
        self.session
            .as_ref()
            .filter(|session| !session.is_terminal())
            .map(|session| session.id)
    }

    /// Replaces the current session, returning the id of a superseded in-flight one.
    pub(crate) fn begin(
        &mut self,
        query: String,
        online_search: bool,
    ) -> (SessionId, Option<SessionId>) {
        let superseded = self.in_flight();
        self.last_id += 1;
        let id = self.last_id;
        self.session = Some(QuerySession::new(id, query, online_search));
        (id, superseded)
    }

    /// Mutable access to the session, but only if `id` is the current one.
    pub(crate) fn current_mut(&mut self, id: SessionId) -> Option<&mut QuerySession> {
        self.session.as_mut().filter(|session| session.id == id)
    }
}
