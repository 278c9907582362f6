//! Status flow reconstruction. Infers a funnel of stage transitions from
//! point-in-time job statuses.
//!
//! There is no transition log: each application contributes one inferred path
//! from `Applied` to its current status. Rejections and withdrawals branch on
//! evidence (a recorded offer, then any interview) to decide where they left the
//! pipeline. The same input always yields the same graph.
//!
//! Applications that were never submitted (`Not Applied`) never entered the
//! pipeline and contribute nothing.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::job::{InvalidStatus, JobRow, JobStatus};

/// A node in the funnel: every job status plus the synthetic `Pending` stage
/// for applications still sitting at `Applied`.
///
/// Variant order is pipeline order and drives node and edge ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    Applied,
    Interviewing,
    #[serde(rename = "Offer Received")]
    OfferReceived,
    Accepted,
    Rejected,
    Withdrawn,
    #[serde(rename = "Not Applied")]
    NotApplied,
    Pending,
}

impl From<JobStatus> for PipelineStage {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Applied => PipelineStage::Applied,
            JobStatus::Interviewing => PipelineStage::Interviewing,
            JobStatus::OfferReceived => PipelineStage::OfferReceived,
            JobStatus::Accepted => PipelineStage::Accepted,
            JobStatus::Rejected => PipelineStage::Rejected,
            JobStatus::Withdrawn => PipelineStage::Withdrawn,
            JobStatus::NotApplied => PipelineStage::NotApplied,
        }
    }
}

/// Read-only snapshot of the fields the reconstruction looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobApplication {
    pub status: String,
    pub has_interview_history: bool,
    pub has_offer: bool,
}

impl JobApplication {
    pub fn new(status: impl Into<String>, has_interview_history: bool, has_offer: bool) -> Self {
        Self {
            status: status.into(),
            has_interview_history,
            has_offer,
        }
    }
}

impl From<&JobRow> for JobApplication {
    fn from(job: &JobRow) -> Self {
        Self {
            status: job.status.clone(),
            has_interview_history: job.has_interview_history(),
            has_offer: job.has_offer(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub source: PipelineStage,
    pub target: PipelineStage,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowGraph {
    pub nodes: BTreeSet<PipelineStage>,
    pub edges: Vec<FlowEdge>,
}

#[cfg(test)]
impl FlowGraph {
    /// Count on the `source → target` edge, zero when the edge was not observed.
    pub fn edge_count(&self, source: PipelineStage, target: PipelineStage) -> u32 {
        self.edges
            .iter()
            .find(|edge| edge.source == source && edge.target == target)
            .map(|edge| edge.count)
            .unwrap_or(0)
    }

    /// Sum of counts leaving `source`, optionally ignoring the synthetic `Pending` edge.
    pub fn outgoing_total(&self, source: PipelineStage, include_pending: bool) -> u32 {
        self.edges
            .iter()
            .filter(|edge| edge.source == source)
            .filter(|edge| include_pending || edge.target != PipelineStage::Pending)
            .map(|edge| edge.count)
            .sum()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),
}

/// Builds the weighted stage graph for a set of applications.
///
/// Fails on the first record whose status is outside the known set rather than
/// guessing a stage for it.
pub fn reconstruct_flow(applications: &[JobApplication]) -> Result<FlowGraph, FlowError> {
    let mut counts: BTreeMap<(PipelineStage, PipelineStage), u32> = BTreeMap::new();
    let mut pending = 0_u32;

    for application in applications {
        let status: JobStatus = application.status.parse()?;
        if status == JobStatus::Applied {
            pending += 1;
            continue;
        }

        let path = inferred_path(
            status,
            application.has_interview_history,
            application.has_offer,
        );
        for step in path.windows(2) {
            *counts.entry((step[0], step[1])).or_insert(0) += 1;
        }
    }

    if pending > 0 {
        counts.insert((PipelineStage::Applied, PipelineStage::Pending), pending);
    }

    let mut nodes = BTreeSet::new();
    let edges = counts
        .into_iter()
        .map(|((source, target), count)| {
            nodes.insert(source);
            nodes.insert(target);
            FlowEdge {
                source,
                target,
                count,
            }
        })
        .collect();

    Ok(FlowGraph { nodes, edges })
}

/// The stages an application is assumed to have passed through, starting at
/// `Applied`. Empty for applications that never entered the pipeline.
fn inferred_path(status: JobStatus, has_interview: bool, has_offer: bool) -> Vec<PipelineStage> {
    use PipelineStage::*;

    match status {
        JobStatus::NotApplied => vec![],
        JobStatus::Applied => vec![Applied],
        JobStatus::Interviewing => vec![Applied, Interviewing],
        JobStatus::OfferReceived => vec![Applied, Interviewing, OfferReceived],
        JobStatus::Accepted => vec![Applied, Interviewing, OfferReceived, Accepted],
        JobStatus::Rejected | JobStatus::Withdrawn => {
            let exit = PipelineStage::from(status);
            if has_offer {
                vec![Applied, Interviewing, OfferReceived, exit]
            } else if has_interview {
                vec![Applied, Interviewing, exit]
            } else {
                vec![Applied, exit]
            }
        }
    }
}
