//! Worker-isolated request channel for the halftone engine.
//!
//! Each [`EngineHandle`] owns one dedicated thread hosting a private
//! [`HalftoneEngine`]. Requests are processed strictly in submission order and
//! responses come back in that same order, but callers should still correlate
//! by [`RequestId`] — a caller juggling several handles, or reissuing after a
//! disposal, cannot lean on FIFO alone. "Latest wins" is the caller's job:
//! compare each response id against the most recently issued one and drop
//! stale responses.

use std::sync::mpsc;
use std::thread;

use crate::core::{Bitmap, RenderParams, RequestId};
use crate::engine::HalftoneEngine;
use crate::error::{BendayError, BendayResult};

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub enum EngineRequest {
    /// Replace the current source. Must precede any `Render`. Dimensions are
    /// validated at `Bitmap` construction, so the worker only ever sees
    /// structurally valid sources.
    SetSource(Bitmap),
    Render {
        request_id: RequestId,
        params: RenderParams,
    },
    /// Release all owned buffers and stop the worker thread.
    Dispose,
}

/// Structural failures surfaced per request. Presentation parameters are
/// clamped inside the engine and never produce an error response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderErrorKind {
    MissingSource,
    Allocation,
}

impl From<&BendayError> for RenderErrorKind {
    fn from(err: &BendayError) -> Self {
        match err {
            BendayError::MissingSource(_) | BendayError::Disposed(_) => Self::MissingSource,
            _ => Self::Allocation,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub enum EngineResponse {
    /// Ownership of the bitmap transfers to the caller.
    Complete {
        request_id: RequestId,
        bitmap: Bitmap,
    },
    Failed {
        request_id: RequestId,
        error: RenderErrorKind,
    },
}

/// Caller-side endpoint of the request channel.
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
    rx: mpsc::Receiver<EngineResponse>,
    join: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    /// Spawn a dedicated engine thread and connect the request/response pair.
    pub fn spawn() -> BendayResult<Self> {
        let (req_tx, req_rx) = mpsc::channel::<EngineRequest>();
        let (resp_tx, resp_rx) = mpsc::channel::<EngineResponse>();
        let join = thread::Builder::new()
            .name("benday-engine".to_owned())
            .spawn(move || run_engine(req_rx, resp_tx))
            .map_err(|e| {
                BendayError::Other(anyhow::anyhow!("failed to spawn engine thread: {e}"))
            })?;
        Ok(Self {
            tx: req_tx,
            rx: resp_rx,
            join: Some(join),
        })
    }

    /// Transfer a new source to the engine. Infrequent bulk operation; there
    /// is no acknowledgement message.
    pub fn set_source(&self, bitmap: Bitmap) -> BendayResult<()> {
        self.send(EngineRequest::SetSource(bitmap))
    }

    /// Queue one render. The response arrives later via [`recv`] or
    /// [`try_recv`] carrying the same `request_id`.
    ///
    /// [`recv`]: EngineHandle::recv
    /// [`try_recv`]: EngineHandle::try_recv
    pub fn request_render(&self, request_id: RequestId, params: RenderParams) -> BendayResult<()> {
        self.send(EngineRequest::Render { request_id, params })
    }

    /// Block until the next response.
    pub fn recv(&self) -> BendayResult<EngineResponse> {
        self.rx
            .recv()
            .map_err(|_| BendayError::disposed("engine worker hung up"))
    }

    /// Non-blocking poll for the next response.
    pub fn try_recv(&self) -> BendayResult<Option<EngineResponse>> {
        match self.rx.try_recv() {
            Ok(resp) => Ok(Some(resp)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => {
                Err(BendayError::disposed("engine worker hung up"))
            }
        }
    }

    /// Tear the worker down. In-flight requests ahead of the `Dispose` are
    /// still processed; their responses can no longer be read.
    pub fn dispose(mut self) -> BendayResult<()> {
        let _ = self.tx.send(EngineRequest::Dispose);
        self.join_worker()
    }

    fn send(&self, req: EngineRequest) -> BendayResult<()> {
        self.tx
            .send(req)
            .map_err(|_| BendayError::disposed("engine worker is no longer accepting requests"))
    }

    fn join_worker(&mut self) -> BendayResult<()> {
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| BendayError::disposed("engine worker panicked"))?;
        }
        Ok(())
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(EngineRequest::Dispose);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

fn run_engine(rx: mpsc::Receiver<EngineRequest>, tx: mpsc::Sender<EngineResponse>) {
    let mut engine = HalftoneEngine::new();
    while let Ok(req) = rx.recv() {
        match req {
            EngineRequest::SetSource(bitmap) => {
                if let Err(e) = engine.set_source(bitmap) {
                    tracing::warn!(error = %e, "set_source rejected");
                }
            }
            EngineRequest::Render { request_id, params } => {
                let resp = match engine.render(&params) {
                    Ok(bitmap) => EngineResponse::Complete { request_id, bitmap },
                    Err(e) => EngineResponse::Failed {
                        request_id,
                        error: RenderErrorKind::from(&e),
                    },
                };
                // Caller hung up; nothing left to serve.
                if tx.send(resp).is_err() {
                    break;
                }
            }
            EngineRequest::Dispose => {
                engine.dispose();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_from_engine_errors() {
        let missing = BendayError::missing_source("x");
        assert_eq!(RenderErrorKind::from(&missing), RenderErrorKind::MissingSource);
        let alloc = BendayError::allocation("x");
        assert_eq!(RenderErrorKind::from(&alloc), RenderErrorKind::Allocation);
    }

    #[test]
    fn error_kind_serde_uses_snake_case() {
        let s = serde_json::to_string(&RenderErrorKind::MissingSource).unwrap();
        assert_eq!(s, "\"missing_source\"");
    }
}
