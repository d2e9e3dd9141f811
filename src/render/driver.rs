use crate::audio::{AudioTrack, write_f32le_file};
use crate::compose::timeline::CompositionTimeline;
use crate::config::CompositionConfig;
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{VeilError, VeilResult};
use crate::frame::Frame;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

const MAX_REORDER_BUFFER_BYTES: u64 = 128 * 1024 * 1024;

/// Options controlling [`RenderDriver`] range rendering behavior.
#[derive(Clone, Debug)]
pub struct RenderOpts {
    /// Enable frame-level parallelism (rayon), using a dedicated thread pool.
    pub parallel: bool,
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Chunk size used by the render->encode streaming pipeline.
    pub chunk_size: usize,
    /// Bounded channel capacity between render workers and the encoder thread.
    pub channel_capacity: usize,
    /// Checked between frames; once set, the render stops with [`VeilError::Cancelled`].
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            chunk_size: 64,
            channel_capacity: 4,
            cancel: None,
        }
    }
}

/// Range render statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Total frames in the requested range.
    pub frames_total: u64,
    /// Frames composited and handed to the encoder.
    pub frames_rendered: u64,
}

/// A fully materialized render: every grid frame plus the fitted audio track.
#[derive(Clone, Debug)]
pub struct RenderedClip {
    /// Output frame rate.
    pub fps: Fps,
    /// Output duration in seconds.
    pub total_duration_sec: f64,
    /// `(timestamp, frame)` pairs in grid order.
    pub frames: Vec<(f64, Frame)>,
    /// Audio derived from the background clip, if it has any.
    pub audio: Option<AudioTrack>,
}

/// Output grid `t_k = k / fps` for `k in 0..frame_count`, paired with the frame index.
pub fn frame_grid(cfg: &CompositionConfig) -> impl Iterator<Item = (FrameIndex, f64)> + '_ {
    (0..cfg.frame_count()).map(move |k| {
        let idx = FrameIndex(k);
        (idx, cfg.frame_time_secs(idx))
    })
}

/// Render every grid frame of `timeline` into memory.
///
/// Intended for short clips and tests; full-size renders should stream through
/// [`RenderDriver::render_range`] instead.
pub fn render_clip(
    timeline: &CompositionTimeline,
    audio: Option<AudioTrack>,
) -> VeilResult<RenderedClip> {
    let cfg = timeline.config();
    let frames = frame_grid(cfg)
        .map(|(_, t)| timeline.render_frame(t).map(|f| (t, f)))
        .collect::<VeilResult<Vec<_>>>()?;
    Ok(RenderedClip {
        fps: cfg.fps,
        total_duration_sec: cfg.total_duration_sec,
        frames,
        audio,
    })
}

/// Drives a timeline over the output frame grid and streams the results into a sink.
#[derive(Clone, Debug, Default)]
pub struct RenderDriver {
    opts: RenderOpts,
}

impl RenderDriver {
    /// Create a driver with the given options.
    pub fn new(opts: RenderOpts) -> Self {
        Self { opts }
    }

    /// Options this driver renders with.
    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    /// Render the full output duration into `sink`.
    pub fn render_all(
        &self,
        timeline: &CompositionTimeline,
        audio: Option<&AudioTrack>,
        sink: &mut dyn FrameSink,
    ) -> VeilResult<RenderStats> {
        self.render_range(timeline, timeline.config().frame_range(), audio, sink)
    }

    /// Render a frame range and stream frames into a sink.
    ///
    /// The sink receives frames in strictly increasing frame index order. When `parallel` is
    /// enabled, out-of-order worker completion is deterministically reordered at the sink boundary
    /// (bounded channel backpressure). On any failure, cancellation included, the sink is aborted
    /// and never sees `end`.
    #[tracing::instrument(level = "debug", skip_all, fields(start = range.start.0, end = range.end.0))]
    pub fn render_range(
        &self,
        timeline: &CompositionTimeline,
        range: FrameRange,
        audio: Option<&AudioTrack>,
        sink: &mut dyn FrameSink,
    ) -> VeilResult<RenderStats> {
        let cfg = timeline.config();
        if range.is_empty() {
            return Err(VeilError::validation(
                "render_range range must be non-empty",
            ));
        }
        if range.end.0 > cfg.frame_count() {
            return Err(VeilError::validation(
                "render_range range must be within composition duration",
            ));
        }

        // The first frame fixes the output size for the whole render.
        let first = self.render_one(timeline, range.start.0)?;
        let (width, height) = first.dims();

        let mut audio_tmp = TempFileGuard(None);
        let audio_cfg = match audio {
            Some(track) if !track.interleaved_f32.is_empty() => {
                let path = std::env::temp_dir().join(format!(
                    "veilmix_audio_{}_{}.f32le",
                    std::process::id(),
                    std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .map(|d| d.as_nanos())
                        .unwrap_or(0)
                ));
                write_f32le_file(track, &path)?;
                audio_tmp.0 = Some(path.clone());
                Some(AudioInputConfig {
                    path,
                    sample_rate: track.sample_rate,
                    channels: track.channels,
                })
            }
            _ => None,
        };

        let sink_cfg = SinkConfig {
            width,
            height,
            fps: cfg.fps,
            audio: audio_cfg,
        };

        let res = self.stream(timeline, range, first, sink_cfg, sink);
        drop(audio_tmp);
        match &res {
            Ok(stats) => tracing::info!(
                frames = stats.frames_total,
                width,
                height,
                "render finished"
            ),
            Err(e) => {
                tracing::warn!(error = %e, "render failed, aborting sink");
                sink.abort();
            }
        }
        res
    }

    fn stream(
        &self,
        timeline: &CompositionTimeline,
        range: FrameRange,
        first: Frame,
        cfg: SinkConfig,
        sink: &mut dyn FrameSink,
    ) -> VeilResult<RenderStats> {
        let cap = self.opts.channel_capacity.max(1);
        let bytes_per_frame = u64::from(cfg.width)
            .saturating_mul(u64::from(cfg.height))
            .saturating_mul(3)
            .max(1);
        let max_chunk_by_mem = (MAX_REORDER_BUFFER_BYTES / bytes_per_frame).max(1);

        let mut chunk_size = normalized_chunk_size(self.opts.chunk_size).min(max_chunk_by_mem);
        chunk_size = chunk_size.min(range.len_frames());

        let pool = if self.opts.parallel {
            Some(build_thread_pool(self.opts.threads)?)
        } else {
            None
        };

        // Encoder thread: enforce in-order delivery to the sink regardless of render completion
        // order.
        std::thread::scope(|scope| -> VeilResult<RenderStats> {
            let (tx, rx) = mpsc::sync_channel::<FrameMsg>(cap);
            let range_start = range.start.0;
            let range_end = range.end.0;
            let sink_ref: &mut dyn FrameSink = sink;

            // Yields `false` when the producer hangs up early; `end` is only reached on a full range.
            let enc = scope.spawn(move || -> VeilResult<bool> {
                sink_ref.begin(cfg)?;

                let mut next = range_start;
                let mut pending = HashMap::<u64, Frame>::new();
                while next < range_end {
                    if let Some(frame) = pending.remove(&next) {
                        sink_ref.push_frame(FrameIndex(next), &frame)?;
                        next += 1;
                        continue;
                    }

                    let Ok(msg) = rx.recv() else {
                        return Ok(false);
                    };
                    pending.insert(msg.idx.0, msg.frame);
                }

                sink_ref.end()?;
                Ok(true)
            });

            let mut stats = RenderStats::default();
            let produce_res = (|| -> VeilResult<()> {
                send(
                    &tx,
                    FrameMsg {
                        idx: FrameIndex(range_start),
                        frame: first,
                    },
                )?;
                stats.frames_total += 1;
                stats.frames_rendered += 1;

                let mut chunk_start = range_start + 1;
                while chunk_start < range_end {
                    self.check_cancelled()?;
                    let chunk_end = (chunk_start + chunk_size).min(range_end);
                    if let Some(pool) = pool.as_ref() {
                        let tx = tx.clone();
                        pool.install(|| {
                            (chunk_start..chunk_end).into_par_iter().try_for_each(
                                move |f| -> VeilResult<()> {
                                    let frame = self.render_one(timeline, f)?;
                                    send(
                                        &tx,
                                        FrameMsg {
                                            idx: FrameIndex(f),
                                            frame,
                                        },
                                    )
                                },
                            )
                        })?;
                    } else {
                        for f in chunk_start..chunk_end {
                            let frame = self.render_one(timeline, f)?;
                            send(
                                &tx,
                                FrameMsg {
                                    idx: FrameIndex(f),
                                    frame,
                                },
                            )?;
                        }
                    }
                    stats.frames_total += chunk_end - chunk_start;
                    stats.frames_rendered += chunk_end - chunk_start;
                    tracing::debug!(done = chunk_end, total = range_end, "chunk rendered");
                    chunk_start = chunk_end;
                }
                Ok(())
            })();

            drop(tx);
            let enc_res = enc
                .join()
                .map_err(|_| VeilError::encode("encoder thread panicked"))?;

            // A failing sink closes the channel, so its error outranks the producer's.
            let completed = enc_res?;
            produce_res?;
            if !completed {
                return Err(VeilError::encode(
                    "render stopped before all frames were delivered",
                ));
            }
            Ok(stats)
        })
    }

    fn render_one(&self, timeline: &CompositionTimeline, f: u64) -> VeilResult<Frame> {
        self.check_cancelled()?;
        let t = timeline.config().frame_time_secs(FrameIndex(f));
        timeline.render_frame(t)
    }

    fn check_cancelled(&self) -> VeilResult<()> {
        match &self.opts.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(VeilError::Cancelled),
            _ => Ok(()),
        }
    }
}

#[derive(Debug)]
struct FrameMsg {
    idx: FrameIndex,
    frame: Frame,
}

fn send(tx: &mpsc::SyncSender<FrameMsg>, msg: FrameMsg) -> VeilResult<()> {
    tx.send(msg)
        .map_err(|_| VeilError::encode("encoder thread is not accepting frames"))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

fn build_thread_pool(threads: Option<usize>) -> VeilResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(VeilError::validation(
            "render 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| VeilError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/driver.rs"]
mod tests;
