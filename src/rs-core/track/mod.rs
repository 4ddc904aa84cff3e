mod fragment;

pub(crate) use fragment::{CipherMethod, Fragment, FragmentRef, KeyMaterial};

use crate::Logger;
use thiserror::Error;

/// Identifies a track amongst the ones announced for the current content.
pub(crate) type TrackId = u32;

/// Parsed fragment list and metadata for one track.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TrackDetails {
    /// Fragments, sorted by start time.
    fragments: Vec<Fragment>,

    /// If `true`, fragments announce an absolute start time that can be used to keep
    /// tracks in sync.
    has_program_date_time: bool,

    /// If `true`, the fragment list is refreshed as the content evolves.
    live: bool,
}

impl TrackDetails {
    /// Build a new `TrackDetails`, checking that the fragment list can be scheduled.
    pub(crate) fn new(
        fragments: Vec<Fragment>,
        has_program_date_time: bool,
        live: bool,
    ) -> Result<Self, TrackDetailsError> {
        if fragments.is_empty() {
            return Err(TrackDetailsError::NoFragment);
        }
        for (i, frag) in fragments.iter().enumerate() {
            if frag.duration.is_nan() || frag.duration <= 0. {
                return Err(TrackDetailsError::InvalidDuration { sn: frag.sn });
            }
            if i > 0 {
                let prev = &fragments[i - 1];
                if frag.start < prev.start {
                    return Err(TrackDetailsError::UnsortedFragments { sn: frag.sn });
                }
                if prev.sn.checked_add(1) != Some(frag.sn) {
                    return Err(TrackDetailsError::NonContiguousSequenceNumbers {
                        previous: prev.sn,
                        next: frag.sn,
                    });
                }
            }
        }
        Ok(Self {
            fragments,
            has_program_date_time,
            live,
        })
    }

    pub(crate) fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub(crate) fn has_program_date_time(&self) -> bool {
        self.has_program_date_time
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live
    }

    /// End, in seconds, of the last fragment.
    pub(crate) fn end(&self) -> f64 {
        self.fragments.last().map_or(0., |f| f.end())
    }

    pub(crate) fn fragment(&self, sn: u32) -> Option<&Fragment> {
        let first_sn = self.fragments.first()?.sn;
        let idx = sn.checked_sub(first_sn)? as usize;
        self.fragments.get(idx)
    }

    /// Set the loaded key on every fragment whose key is fetched from `uri`.
    ///
    /// Returns the number of fragments updated.
    pub(crate) fn install_key(&mut self, uri: Option<&str>, key: &[u8]) -> usize {
        let mut updated = 0;
        for km in self.fragments.iter_mut().filter_map(|f| f.key.as_mut()) {
            if km.uri.as_deref() == uri {
                km.key = Some(key.to_vec());
                updated += 1;
            }
        }
        updated
    }

    /// Take back the keys already loaded in `previous`, on every fragment of this list whose
    /// key is fetched from the same uri.
    ///
    /// Returns the number of fragments updated.
    pub(crate) fn inherit_keys(&mut self, previous: &TrackDetails) -> usize {
        let mut loaded: Vec<(Option<&str>, &[u8])> = vec![];
        for km in previous.fragments.iter().filter_map(|f| f.key.as_ref()) {
            if let Some(key) = &km.key {
                if !loaded.iter().any(|(uri, _)| *uri == km.uri.as_deref()) {
                    loaded.push((km.uri.as_deref(), key));
                }
            }
        }
        loaded
            .into_iter()
            .map(|(uri, key)| self.install_key(uri, key))
            .sum()
    }

    /// Re-align a refreshed live fragment list on the previous one.
    ///
    /// Fragments also present in `previous` (same sequence number) take back their former
    /// start time, and the ones announced after them follow contiguously. Without any
    /// common fragment, the whole list is offset by `reference_start`.
    pub(crate) fn align_on(&mut self, previous: Option<&TrackDetails>, reference_start: f64) {
        let mut last_common_idx = None;
        if let Some(previous) = previous {
            for (idx, frag) in self.fragments.iter_mut().enumerate() {
                if let Some(old) = previous.fragment(frag.sn) {
                    frag.start = old.start;
                    last_common_idx = Some(idx);
                }
            }
        }
        match last_common_idx {
            None => {
                Logger::debug("Track: no common fragment with previous details, using reference");
                self.fragments
                    .iter_mut()
                    .for_each(|f| f.start += reference_start);
            }
            Some(idx) => {
                for i in idx + 1..self.fragments.len() {
                    self.fragments[i].start = self.fragments[i - 1].end();
                }
            }
        }
    }
}

/// Errors making a fragment list unusable for scheduling.
#[derive(Error, Debug, PartialEq, Eq)]
pub(crate) enum TrackDetailsError {
    #[error("The track details contain no fragment")]
    NoFragment,
    #[error("Fragment {sn} has an invalid duration")]
    InvalidDuration { sn: u32 },
    #[error("Fragment {sn} starts before the fragment preceding it")]
    UnsortedFragments { sn: u32 },
    #[error("Fragment {next} follows fragment {previous}: sequence numbers are not contiguous")]
    NonContiguousSequenceNumbers { previous: u32, next: u32 },
}

/// A track the scheduler can load fragments from.
#[derive(Clone, Debug)]
pub(crate) struct Track {
    id: TrackId,
    details: Option<TrackDetails>,
}

impl Track {
    pub(crate) fn new(id: TrackId) -> Self {
        Self { id, details: None }
    }

    pub(crate) fn id(&self) -> TrackId {
        self.id
    }

    pub(crate) fn details(&self) -> Option<&TrackDetails> {
        self.details.as_ref()
    }

    pub(crate) fn details_mut(&mut self) -> Option<&mut TrackDetails> {
        self.details.as_mut()
    }

    pub(crate) fn set_details(&mut self, details: TrackDetails) {
        self.details = Some(details);
    }
}

/// The list of tracks announced for the current content.
#[derive(Clone, Debug, Default)]
pub(crate) struct TrackList {
    tracks: Vec<Track>,
}

impl TrackList {
    pub(crate) fn new(ids: &[TrackId]) -> Self {
        Self {
            tracks: ids.iter().map(|id| Track::new(*id)).collect(),
        }
    }

    pub(crate) fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.iter().map(|t| t.id)
    }
}
