//! Partner selection over the opposite waiting pool.
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use scoring::{pick_best, CandidateProfile, ReasonTag};
use serde::Serialize;
use store::{ProfileDirectory, UserProfile};
use tracing::{debug, warn};

use crate::config::MatchingConfig;
use crate::error::MatchmakerError;
use crate::queues::MatchQueues;
use crate::rooms::RoomManager;

/// Which path picked the partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchAlgorithm {
    /// Compatibility ranking.
    #[serde(rename = "v5")]
    Scored,
    /// First eligible queue entry.
    #[serde(rename = "fifo")]
    Fifo,
}

impl MatchAlgorithm {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MatchAlgorithm::Scored => "v5",
            MatchAlgorithm::Fifo => "fifo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerChoice {
    pub partner_id: String,
    pub algorithm: MatchAlgorithm,
    /// Zero on the FIFO path.
    pub score: u32,
    pub reasons: Vec<ReasonTag>,
}

/// Project a profile onto the attributes the scorer reads.
pub fn candidate_profile(profile: &UserProfile) -> CandidateProfile {
    CandidateProfile {
        id: profile.id.clone(),
        interests: profile.interests.clone(),
        values: profile.values.clone(),
        languages: profile.languages.clone(),
        habits: profile.habits.clone(),
        prompts: profile
            .prompts
            .iter()
            .map(|p| format!("{}\n{}", p.question, p.answer))
            .collect(),
        last_active_at: profile.last_active_at,
    }
}

/// Finds and claims a partner for a requester.
#[derive(Clone)]
pub struct Matchmaker {
    queues: MatchQueues,
    rooms: RoomManager,
    directory: Arc<dyn ProfileDirectory>,
    config: MatchingConfig,
}

impl Matchmaker {
    pub fn new(
        queues: MatchQueues,
        rooms: RoomManager,
        directory: Arc<dyn ProfileDirectory>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            queues,
            rooms,
            directory,
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Pick a partner from the opposite pool and remove them from it.
    ///
    /// With scored matching on, the best-ranked eligible candidate is taken
    /// if it clears `min_score`; otherwise, or when scoring finds nobody,
    /// the first eligible entry within the scan cap is taken. Eligible means
    /// not the requester and not paired with them during the cooldown.
    pub fn select_partner(
        &self,
        requester: &UserProfile,
        now: DateTime<Utc>,
    ) -> Result<Option<PartnerChoice>, MatchmakerError> {
        let opposite = requester.category().opposite();
        let queue = self.queues.snapshot(opposite)?;
        if queue.is_empty() {
            return Ok(None);
        }

        let cooldown =
            self.rooms
                .recent_partner_ids(&requester.id, self.config.pair_cooldown_minutes, now)?;

        if self.config.scored_enabled {
            if let Some(choice) = self.select_scored(requester, &queue, &cooldown, now)? {
                return Ok(Some(choice));
            }
        }

        let partner = self
            .queues
            .claim_first(opposite, self.config.max_candidates, |id| {
                id != requester.id && !cooldown.contains(id)
            })?;
        Ok(partner.map(|partner_id| PartnerChoice {
            partner_id,
            algorithm: MatchAlgorithm::Fifo,
            score: 0,
            reasons: Vec::new(),
        }))
    }

    fn select_scored(
        &self,
        requester: &UserProfile,
        queue: &[String],
        cooldown: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<PartnerChoice>, MatchmakerError> {
        let limit = self.config.max_candidates;
        let candidates: Vec<CandidateProfile> = queue
            .iter()
            .take(limit)
            .filter(|id| **id != requester.id && !cooldown.contains(id.as_str()))
            .filter_map(|id| match self.directory.find_profile(id) {
                Ok(Some(profile)) => Some(candidate_profile(&profile)),
                Ok(None) => None,
                Err(err) => {
                    warn!(candidate_id = %id, error = %err, "candidate_profile_load_failed");
                    None
                }
            })
            .collect();
        if candidates.is_empty() {
            return Ok(None);
        }

        let me = candidate_profile(requester);
        let Some(best) = pick_best(&me, &candidates, now, limit) else {
            return Ok(None);
        };
        if best.score < self.config.min_score {
            debug!(
                candidate_id = %best.candidate_id,
                score = best.score,
                min_score = self.config.min_score,
                "best_candidate_below_min_score"
            );
            return Ok(None);
        }

        // The candidate may have left or been matched since the snapshot.
        let opposite = requester.category().opposite();
        if !self.queues.claim(opposite, &best.candidate_id)? {
            return Ok(None);
        }
        Ok(Some(PartnerChoice {
            partner_id: best.candidate_id,
            algorithm: MatchAlgorithm::Scored,
            score: best.score,
            reasons: best.reasons,
        }))
    }
}
