use thiserror::Error;

use crate::{
    bindings::{DecryptJobId, Environment, MediaType, ResourceId},
    track::{CipherMethod, Fragment, FragmentRef, TrackId},
    Logger,
};

/// Timing of a decryption operation, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DecryptStats {
    /// When the decryption was started.
    pub(crate) tstart: f64,
    /// When the decryption finished.
    pub(crate) tdecrypt: f64,
}

/// Links an asynchronous decryption to the context which started it.
///
/// A token is invalidated by `DecryptionCoordinator::cancel_all`, after which the result
/// of the corresponding operation is not wanted anymore.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CancellationToken {
    generation: u32,
}

/// Reasons for which a loaded fragment is not handled by the decryption path.
#[derive(Error, Debug, PartialEq, Eq)]
pub(crate) enum DecryptSkip {
    #[error("the payload is empty")]
    EmptyPayload,
    #[error("the fragment has no key material")]
    NoKeyMaterial,
    #[error("the fragment's key has not been loaded")]
    KeyNotLoaded,
    #[error("the `{0}` encryption method is not supported")]
    UnsupportedMethod(String),
}

struct DecryptTask {
    job_id: DecryptJobId,
    fragment: FragmentRef,
    token: CancellationToken,
    tstart: f64,
}

/// Orchestrates the decryption of loaded fragments.
///
/// The cipher itself is provided by the `Environment`. Results are only republished if
/// the operation has not been cancelled and its track is still the one being loaded.
pub(crate) struct DecryptionCoordinator {
    generation: u32,
    pending: Vec<DecryptTask>,
}

impl DecryptionCoordinator {
    pub(crate) fn new() -> Self {
        Self {
            generation: 0,
            pending: vec![],
        }
    }

    fn token(&self) -> CancellationToken {
        CancellationToken {
            generation: self.generation,
        }
    }

    fn is_cancelled(&self, token: CancellationToken) -> bool {
        token.generation != self.generation
    }

    /// Invalidate all pending decryption operations.
    pub(crate) fn cancel_all(&mut self) {
        if self.pending_count() > 0 {
            Logger::debug(&format!(
                "Decrypter: Cancelling {} pending operation(s)",
                self.pending_count()
            ));
        }
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Start decrypting the `payload` of a loaded `fragment` if it needs it.
    pub(crate) fn start(
        &mut self,
        env: &mut dyn Environment,
        fragment: &Fragment,
        reference: FragmentRef,
        payload: ResourceId,
        payload_size: u32,
    ) -> Result<DecryptJobId, DecryptSkip> {
        if payload_size == 0 {
            return Err(DecryptSkip::EmptyPayload);
        }
        let key_material = fragment.key.as_ref().ok_or(DecryptSkip::NoKeyMaterial)?;
        match &key_material.method {
            CipherMethod::Aes128 => {}
            CipherMethod::SampleAes => {
                return Err(DecryptSkip::UnsupportedMethod("SAMPLE-AES".to_owned()))
            }
            CipherMethod::Other(name) => return Err(DecryptSkip::UnsupportedMethod(name.clone())),
        }
        let key = key_material.key.as_ref().ok_or(DecryptSkip::KeyNotLoaded)?;
        let iv = key_material.iv_for(fragment.sn);

        let tstart = env.now();
        let job_id = env.decrypt(payload, key, &iv);
        Logger::debug(&format!(
            "Decrypter: Decrypting fragment {} (track {})",
            reference.sn, reference.track_id
        ));
        self.pending.push(DecryptTask {
            job_id,
            fragment: reference,
            token: self.token(),
            tstart,
        });
        Ok(job_id)
    }

    /// Method to call once the decryption operation `job_id` finished, with the resulting
    /// `plaintext`.
    ///
    /// Announces the decrypted fragment and returns its reference, unless the operation is
    /// unknown, has been cancelled, or concerns another track than `current_track`, in which
    /// case the plaintext is freed and `None` is returned.
    pub(crate) fn on_completed(
        &mut self,
        env: &mut dyn Environment,
        media_type: MediaType,
        job_id: DecryptJobId,
        plaintext: ResourceId,
        current_track: Option<TrackId>,
    ) -> Option<FragmentRef> {
        let task = match self.pending.iter().position(|t| t.job_id == job_id) {
            Some(idx) => self.pending.remove(idx),
            None => {
                Logger::warn("Decrypter: Unknown decryption operation finished");
                env.free_resource(plaintext);
                return None;
            }
        };
        if self.is_cancelled(task.token) || current_track != Some(task.fragment.track_id) {
            Logger::info(&format!(
                "Decrypter: Dropping stale decrypted fragment {} (track {})",
                task.fragment.sn, task.fragment.track_id
            ));
            env.free_resource(plaintext);
            return None;
        }
        let stats = DecryptStats {
            tstart: task.tstart,
            tdecrypt: env.now(),
        };
        env.announce_decrypted(media_type, &task.fragment, plaintext, stats);
        Some(task.fragment)
    }
}
