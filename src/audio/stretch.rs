// Asynchronous time-stretch rendering
//
// Offline stretch modes are rendered out of process. A request returns a
// job handle immediately; the editor joins the handle after interactive
// dragging ends, never during a drag. Issuing a new request for the same
// placement supersedes (cancels) the outstanding job.

use crate::model::audio_item::TimeStretchMode;
use crate::model::SampleUid;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use uuid::Uuid;

/// Everything the renderer needs to produce a stretched sample
#[derive(Debug, Clone, PartialEq)]
pub struct StretchSpec {
    pub sample_uid: SampleUid,
    pub mode: TimeStretchMode,
    pub pitch_shift: f64,
    pub pitch_shift_end: f64,
    pub timestretch_amt: f64,
    pub timestretch_amt_end: f64,
    pub crispness: u8,
}

/// Handle to one outstanding render.
///
/// `wait` blocks until the renderer finishes and yields the uid of the
/// rendered sample, or `None` when the job was cancelled or the
/// renderer failed.
#[derive(Debug)]
pub struct StretchJob {
    id: Uuid,
    rx: mpsc::Receiver<Option<SampleUid>>,
    cancelled: Arc<AtomicBool>,
}

impl StretchJob {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Ask the renderer to stop; `wait` will yield `None`
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Block until the render completes
    pub fn wait(self) -> Option<SampleUid> {
        let result = self.rx.recv().ok().flatten();
        if self.is_cancelled() { None } else { result }
    }
}

/// Boundary to the out-of-process renderer.
///
/// `request` returns `None` when the render could not be started;
/// callers must check before joining.
pub trait StretchBackend {
    fn request(&mut self, spec: &StretchSpec) -> Option<StretchJob>;

    /// Renders completed since the last call, ready for registration
    /// in the sample pool
    fn completed(&mut self) -> Vec<RenderedSample>;
}

/// Worker-thread backend standing in for the engine process.
///
/// Each request spawns one worker that allocates the rendered uid and
/// reports it through the job channel. The rendered frame count scales
/// the source length by the stretch ratio, which is all the editor needs
/// to re-place the item.
pub struct ThreadedStretchBackend {
    render_dir: std::path::PathBuf,
    resolve: Box<dyn Fn(SampleUid) -> Option<(u64, u32)> + Send>,
    register: mpsc::Sender<RenderedSample>,
    rendered_rx: mpsc::Receiver<RenderedSample>,
}

/// A finished render waiting to be registered in the sample pool
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSample {
    pub uid: SampleUid,
    pub path: std::path::PathBuf,
    pub frames: u64,
    pub sample_rate: u32,
}

impl ThreadedStretchBackend {
    /// `resolve` maps a source uid to its (frames, sample_rate); the
    /// pool provides it so the backend never holds the pool lock.
    pub fn new(
        render_dir: std::path::PathBuf,
        resolve: impl Fn(SampleUid) -> Option<(u64, u32)> + Send + 'static,
    ) -> Self {
        let (register, rendered_rx) = mpsc::channel();
        Self {
            render_dir,
            resolve: Box::new(resolve),
            register,
            rendered_rx,
        }
    }

}

static NEXT_RENDER_UID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1 << 32);

impl StretchBackend for ThreadedStretchBackend {
    fn request(&mut self, spec: &StretchSpec) -> Option<StretchJob> {
        if !spec.mode.requires_render() {
            return None;
        }
        let (frames, sample_rate) = (self.resolve)(spec.sample_uid)?;

        let id = Uuid::new_v4();
        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let worker_cancelled = Arc::clone(&cancelled);
        let register = self.register.clone();
        let path = self.render_dir.join(format!("{}.wav", id));
        let ratio = spec.timestretch_amt.max(spec.timestretch_amt_end);

        std::thread::spawn(move || {
            if worker_cancelled.load(Ordering::Acquire) {
                let _ = tx.send(None);
                return;
            }
            let uid = NEXT_RENDER_UID.fetch_add(1, Ordering::Relaxed);
            let rendered = RenderedSample {
                uid,
                path,
                frames: (frames as f64 * ratio).round() as u64,
                sample_rate,
            };
            // Registration may outlive the requester; ignore a closed end
            let _ = register.send(rendered);
            let _ = tx.send(Some(uid));
        });

        Some(StretchJob { id, rx, cancelled })
    }

    fn completed(&mut self) -> Vec<RenderedSample> {
        self.rendered_rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> ThreadedStretchBackend {
        ThreadedStretchBackend::new(std::env::temp_dir(), |uid| {
            if uid == 42 { Some((44_100, 44_100)) } else { None }
        })
    }

    fn spec(mode: TimeStretchMode) -> StretchSpec {
        StretchSpec {
            sample_uid: 42,
            mode,
            pitch_shift: 0.0,
            pitch_shift_end: 0.0,
            timestretch_amt: 2.0,
            timestretch_amt_end: 2.0,
            crispness: 5,
        }
    }

    #[test]
    fn test_realtime_modes_do_not_render() {
        let mut b = backend();
        assert!(b.request(&spec(TimeStretchMode::PitchOnly)).is_none());
        assert!(b.request(&spec(TimeStretchMode::TimeOnly)).is_none());
    }

    #[test]
    fn test_unknown_sample_yields_no_handle() {
        let mut b = backend();
        let mut s = spec(TimeStretchMode::Rubberband);
        s.sample_uid = 999;
        assert!(b.request(&s).is_none());
    }

    #[test]
    fn test_request_then_wait() {
        let mut b = backend();
        let job = b.request(&spec(TimeStretchMode::Sbsms)).expect("handle");
        let uid = job.wait().expect("rendered uid");

        let rendered = b.completed();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].uid, uid);
        // 2x stretch doubles the frame count
        assert_eq!(rendered[0].frames, 88_200);
    }

    #[test]
    fn test_cancelled_job_yields_none() {
        let mut b = backend();
        let job = b.request(&spec(TimeStretchMode::Paulstretch)).expect("handle");
        job.cancel();
        assert!(job.wait().is_none());
    }

    #[test]
    fn test_jobs_have_distinct_ids() {
        let mut b = backend();
        let a = b.request(&spec(TimeStretchMode::Rubberband)).unwrap();
        let c = b.request(&spec(TimeStretchMode::Rubberband)).unwrap();
        assert_ne!(a.id(), c.id());
        a.wait();
        c.wait();
    }
}
