use crate::{
    bindings::{Environment, MediaType, RequestId},
    track::{Fragment, FragmentRef},
    Logger,
};

/// Everything the JavaScript-side needs to fetch a fragment.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FragmentFetchRequest {
    pub(crate) media_type: MediaType,
    pub(crate) fragment: FragmentRef,
    pub(crate) url: String,

    /// Timeout, in milliseconds, after which the request fails. `None` to disable.
    pub(crate) timeout: Option<f64>,
}

/// Everything the JavaScript-side needs to load the key of a fragment.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct KeyLoadRequest {
    pub(crate) media_type: MediaType,
    pub(crate) fragment: FragmentRef,
    pub(crate) key_uri: Option<String>,
}

/// Metadata associated with a pending fragment request.
#[derive(Clone, Debug)]
pub(crate) struct FragmentRequestInfo {
    /// ID identifying the request on the JavaScript-side.
    request_id: RequestId,

    /// The requested fragment, with its track already assigned.
    pub(crate) fragment: Fragment,

    pub(crate) reference: FragmentRef,
}

/// The `Requester` issues fragment requests through the JavaScript-side and keeps track of
/// the ones still pending.
///
/// A completion whose `RequestId` is not known here anymore (because it has been aborted
/// since) is stale and must be ignored.
///
/// Retrying failed requests is left to the JavaScript fetcher: the scheduler just selects
/// the same fragment again on a following tick.
pub(crate) struct Requester {
    /// List information on the current fragment requests performed, by chronological order
    /// (from the time the request was made).
    pending_requests: Vec<FragmentRequestInfo>,

    /// Timeout, in milliseconds, used for fragment requests.
    ///
    /// If that timeout is exceeded, the corresponding request will fail.
    ///
    /// To set to `None` to disable.
    fragment_request_timeout: Option<f64>,
}

impl Requester {
    pub(crate) fn new(fragment_request_timeout: Option<f64>) -> Self {
        Self {
            pending_requests: vec![],
            fragment_request_timeout,
        }
    }

    pub(crate) fn update_fragment_request_timeout(&mut self, timeout: Option<f64>) {
        self.fragment_request_timeout = timeout;
    }

    /// Start loading `fragment`, whose track has to be set, through `request`'s description.
    pub(crate) fn fetch_fragment(
        &mut self,
        env: &mut dyn Environment,
        fragment: Fragment,
        mut request: FragmentFetchRequest,
    ) -> RequestId {
        request.timeout = self.fragment_request_timeout;
        Logger::lazy_info(&|| {
            format!(
                "Requester: Loading {} fragment {} (track {}): {}",
                request.media_type, request.fragment.sn, request.fragment.track_id, request.url
            )
        });
        let request_id = env.fetch_fragment(&request);
        self.pending_requests.push(FragmentRequestInfo {
            request_id,
            fragment,
            reference: request.fragment,
        });
        request_id
    }

    /// Method to call once a request started with `fetch_fragment` succeeded.
    ///
    /// Returns the information of the corresponding request, or `None` if it was not known
    /// (e.g. it has been aborted since).
    pub(crate) fn on_request_finished(
        &mut self,
        request_id: RequestId,
    ) -> Option<FragmentRequestInfo> {
        let idx = self
            .pending_requests
            .iter()
            .position(|r| r.request_id == request_id)?;
        Some(self.pending_requests.remove(idx))
    }

    /// Abort all pending requests: their results, if they come anyway, will be unknown.
    pub(crate) fn abort_all(&mut self, env: &mut dyn Environment) {
        for req in self.pending_requests.drain(..) {
            Logger::debug(&format!(
                "Requester: Aborting request for fragment {} (track {})",
                req.reference.sn, req.reference.track_id
            ));
            if !env.abort_request(req.request_id) {
                // Already finished on the JavaScript-side, e.g. after a failure
                Logger::debug("Requester: Request to abort was not pending anymore");
            }
        }
    }
}
