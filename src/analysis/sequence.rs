// analysis/sequence.rs
use std::collections::HashMap;

use super::types::{AnalysisKind, Ticket};

/// Issues per-kind sequence numbers and tells current tickets from stale ones.
///
/// A response is current only if no request of the same kind was issued after
/// it, whatever order the responses arrive in.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: HashMap<AnalysisKind, u64>,
    /// Tickets at or below this number were invalidated.
    floor: HashMap<AnalysisKind, u64>,
}

impl Sequencer {
    pub fn issue(&mut self, kind: AnalysisKind) -> Ticket {
        let seq = self.latest.entry(kind).or_insert(0);
        *seq += 1;
        Ticket { kind, seq: *seq }
    }

    pub fn latest(&self, kind: AnalysisKind) -> u64 {
        self.latest.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        let latest = self.latest(ticket.kind);
        let floor = self.floor.get(&ticket.kind).copied().unwrap_or(0);
        if ticket.seq <= floor {
            false
        } else if ticket.kind.latest_only() {
            ticket.seq == latest
        } else {
            ticket.seq <= latest
        }
    }

    /// Make every outstanding ticket stale.
    pub fn invalidate_all(&mut self) {
        for kind in AnalysisKind::ALL {
            let latest = self.latest(kind);
            self.floor.insert(kind, latest);
        }
    }
}
