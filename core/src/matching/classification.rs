use crate::ingest::ClassificationIndex;
use crate::matching::candidate::MatchCandidate;
use crate::prelude::{CandidateFilter, WddResult};
use crate::records::WaggleRun;
use log::debug;

/// Keeps detections reviewed as tagged waggles.
///
/// Detections missing from the classification table are dropped.
pub struct ClassificationFilter<'a> {
    index: &'a ClassificationIndex,
}

impl<'a> ClassificationFilter<'a> {
    pub fn new(index: &'a ClassificationIndex) -> Self {
        Self { index }
    }
}

impl CandidateFilter for ClassificationFilter<'_> {
    fn name(&self) -> &'static str {
        "classification"
    }

    fn apply(
        &self,
        _run: &WaggleRun,
        candidates: Vec<MatchCandidate>,
    ) -> WddResult<Vec<MatchCandidate>> {
        Ok(candidates
            .into_iter()
            .filter(|candidate| {
                let id = &candidate.detection.waggle_id;
                match self.index.get(id) {
                    None => {
                        debug!("waggle {} has no classification row", id);
                        false
                    }
                    Some(record) => {
                        let (tagged, waggle) = (record.is_tagged(), record.is_waggle());
                        if !(tagged && waggle) {
                            debug!("waggle {}: tagged {}, waggle {}", id, tagged, waggle);
                        }
                        tagged && waggle
                    }
                }
            })
            .collect())
    }
}
