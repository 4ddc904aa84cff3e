use super::TrackId;

/// Encryption method announced for a fragment's key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum CipherMethod {
    /// Whole-fragment AES-128 in CBC mode, the only method the decryption path handles.
    Aes128,
    SampleAes,
    Other(String),
}

impl CipherMethod {
    pub(crate) fn from_attribute(value: &str) -> Self {
        match value {
            "AES-128" => CipherMethod::Aes128,
            "SAMPLE-AES" => CipherMethod::SampleAes,
            x => CipherMethod::Other(x.to_owned()),
        }
    }
}

/// Information on the key needed to decrypt a fragment.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct KeyMaterial {
    pub(crate) method: CipherMethod,

    /// Where the key can be fetched from.
    pub(crate) uri: Option<String>,

    /// Key bytes, set once the key has been loaded.
    pub(crate) key: Option<Vec<u8>>,

    /// Explicit initialization vector. When absent, it is derived from the fragment's
    /// sequence number.
    pub(crate) iv: Option<Vec<u8>>,
}

impl KeyMaterial {
    pub(crate) fn new(method: CipherMethod, uri: Option<String>, iv: Option<Vec<u8>>) -> Self {
        Self {
            method,
            uri,
            key: None,
            iv,
        }
    }

    /// Returns the initialization vector to use for the fragment whose sequence number is
    /// given.
    pub(crate) fn iv_for(&self, sn: u32) -> Vec<u8> {
        match &self.iv {
            Some(iv) => iv.clone(),
            None => {
                let mut iv = vec![0u8; 16];
                iv[12..].copy_from_slice(&sn.to_be_bytes());
                iv
            }
        }
    }
}

/// Identifies a fragment across asynchronous events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FragmentRef {
    pub(crate) track_id: TrackId,
    pub(crate) sn: u32,
}

/// A time-bounded, independently fetchable unit of a track.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Fragment {
    /// Media sequence number.
    pub(crate) sn: u32,

    /// Start time, in seconds, relative to the track.
    pub(crate) start: f64,

    /// Duration in seconds.
    pub(crate) duration: f64,

    pub(crate) url: String,

    /// Absolute start time, in seconds since the unix epoch, if announced.
    pub(crate) program_date_time: Option<f64>,

    pub(crate) key: Option<KeyMaterial>,

    /// Track this fragment has been selected for. Only set by the scheduler.
    pub(crate) track_id: Option<TrackId>,
}

impl Fragment {
    pub(crate) fn new(sn: u32, start: f64, duration: f64, url: String) -> Self {
        Self {
            sn,
            start,
            duration,
            url,
            program_date_time: None,
            key: None,
            track_id: None,
        }
    }

    pub(crate) fn with_program_date_time(mut self, program_date_time: f64) -> Self {
        self.program_date_time = Some(program_date_time);
        self
    }

    pub(crate) fn with_key(mut self, key: KeyMaterial) -> Self {
        self.key = Some(key);
        self
    }

    pub(crate) fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Absolute end time in seconds, which can be compared across tracks.
    pub(crate) fn end_timestamp(&self) -> Option<f64> {
        self.program_date_time.map(|pdt| pdt + self.duration)
    }

    /// Returns `true` if the fragment cannot be fetched yet because its key still has to be
    /// loaded.
    pub(crate) fn is_encrypted(&self) -> bool {
        matches!(&self.key, Some(k) if k.key.is_none())
    }

    /// Returns the fragment's identity once it has been assigned a track.
    pub(crate) fn reference(&self) -> Option<FragmentRef> {
        self.track_id.map(|track_id| FragmentRef {
            track_id,
            sn: self.sn,
        })
    }
}
