use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capture::StreamSpecification;

/// The one recording session the coordinator tracks
#[derive(Debug, Clone, Default)]
pub struct Session {
    active: bool,
    session_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    specifications: Vec<StreamSpecification>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn specifications(&self) -> &[StreamSpecification] {
        &self.specifications
    }

    /// Mark the session active with a fresh id
    pub fn activate(&mut self, specifications: Vec<StreamSpecification>) -> Uuid {
        let id = Uuid::new_v4();
        self.active = true;
        self.session_id = Some(id);
        self.started_at = Some(Utc::now());
        self.specifications = specifications;
        id
    }

    /// Keep only the specifications the capture context accepted
    pub fn retain_accepted(&mut self, accepted: &[String]) {
        self.specifications.retain(|s| accepted.contains(&s.id));
    }

    pub fn deactivate(&mut self) {
        *self = Session::default();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            active: self.active,
            session_id: self.session_id,
            started_at: self.started_at,
            streams: self.specifications.iter().map(|s| s.id.clone()).collect(),
        }
    }
}

/// Point-in-time view of the session for status queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub active: bool,
    pub session_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub streams: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::TrackDescriptor;

    #[test]
    fn test_activate_and_deactivate() {
        let mut session = Session::default();
        assert!(!session.is_active());

        let id = session.activate(vec![
            StreamSpecification::new("mic", vec![TrackDescriptor::audio()]),
            StreamSpecification::new("cam", vec![TrackDescriptor::video()]),
        ]);
        assert!(session.is_active());
        assert_eq!(session.session_id(), Some(id));

        session.retain_accepted(&["cam".to_string()]);
        assert_eq!(session.snapshot().streams, vec!["cam".to_string()]);

        session.deactivate();
        let snapshot = session.snapshot();
        assert!(!snapshot.active);
        assert!(snapshot.session_id.is_none());
        assert!(snapshot.streams.is_empty());
    }
}
