//! Export graph compiler.
//!
//! Turns the base-track and overlay-track clips plus a media library into a
//! [`RenderGraph`]: a deduplicated input list and an ordered list of filter
//! chains that ffmpeg runs as one `-filter_complex`.

use crate::error::{RenderError, Result};
use reelcut_core::geometry::EPSILON;
use reelcut_core::project::{ExportSettings, Project, Resolution};
use reelcut_core::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

pub const OUTPUT_FPS: u32 = 30;
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;
pub const OUTPUT_VIDEO_LABEL: &str = "outv";
pub const OUTPUT_AUDIO_LABEL: &str = "outa";

const FALLBACK_CANVAS: Canvas = Canvas {
    width: 1280,
    height: 720,
};

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// Output frame size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// Resolve the export resolution. `Source` takes the size of
    /// `first_base`, falling back to 1280x720 when it is unknown.
    pub fn for_resolution(resolution: Resolution, first_base: Option<&MediaItem>) -> Self {
        match resolution {
            Resolution::P1080 => Canvas {
                width: 1920,
                height: 1080,
            },
            Resolution::P720 => Canvas {
                width: 1280,
                height: 720,
            },
            Resolution::Source => first_base
                .filter(|m| m.width > 0 && m.height > 0)
                .map(|m| Canvas {
                    width: even(m.width),
                    height: even(m.height),
                })
                .unwrap_or(FALLBACK_CANVAS),
        }
    }

    /// Width the picture-in-picture overlay is scaled to.
    pub fn overlay_width(&self) -> u32 {
        even(self.width / 4)
    }
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// x264 with yuv420p needs even dimensions.
fn even(v: u32) -> u32 {
    (v & !1).max(2)
}

/// Decimal places written for times in filter arguments (microseconds).
/// Float noise from clip arithmetic sits well below this.
pub const TIME_DECIMALS: usize = 6;

/// Seconds as ffmpeg option values, without trailing zeros.
struct Secs(f64);

impl fmt::Display for Secs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = format!("{:.*}", TIME_DECIMALS, self.0);
        let s = s.trim_end_matches('0').trim_end_matches('.');
        f.write_str(if s == "-0" { "0" } else { s })
    }
}

// ---------------------------------------------------------------------------
// Graph types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderInput {
    pub path: PathBuf,
    pub index: usize,
}

/// One filter in a chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Filter {
    /// Keep `[start, end]` of a video stream, timestamps reset to zero.
    Trim { start: f64, end: f64 },
    /// Keep `[start, end]` of an audio stream, timestamps reset to zero.
    AudioTrim { start: f64, end: f64 },
    Resample { sample_rate: u32 },
    Stereo,
    PixelFormat { format: String },
    /// Scale to a fixed width, keeping aspect ratio.
    ScaleWidth { width: u32 },
    /// Transparent frames before and after the stream.
    TransparentPad { delay: f64, pad_after: f64 },
    /// Composite the second input onto the first at the bottom-right corner.
    Overlay { margin: u32 },
    /// Aspect-preserving scale plus letterbox pad to the canvas.
    Fit { width: u32, height: u32 },
    Fps { fps: u32 },
    Concat { segments: usize },
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Trim { start, end } => write!(
                f,
                "trim=start={}:end={},setpts=PTS-STARTPTS",
                Secs(*start),
                Secs(*end)
            ),
            Filter::AudioTrim { start, end } => write!(
                f,
                "atrim=start={}:end={},asetpts=PTS-STARTPTS",
                Secs(*start),
                Secs(*end)
            ),
            Filter::Resample { sample_rate } => write!(f, "aresample={sample_rate}"),
            Filter::Stereo => f.write_str("aformat=channel_layouts=stereo"),
            Filter::PixelFormat { format } => write!(f, "format={format}"),
            Filter::ScaleWidth { width } => write!(f, "scale={width}:-2"),
            Filter::TransparentPad { delay, pad_after } => write!(
                f,
                "tpad=start_duration={}:stop_duration={}:color=black@0.0",
                Secs(*delay),
                Secs(*pad_after)
            ),
            Filter::Overlay { margin } => write!(
                f,
                "overlay=x=main_w-overlay_w-{margin}:y=main_h-overlay_h-{margin}:eof_action=pass"
            ),
            Filter::Fit { width, height } => write!(
                f,
                "scale={width}:{height}:force_original_aspect_ratio=decrease,pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,setsar=1"
            ),
            Filter::Fps { fps } => write!(f, "fps={fps}"),
            Filter::Concat { segments } => write!(f, "concat=n={segments}:v=1:a=1"),
        }
    }
}

/// A labelled filter chain: `[in]...f1,f2[out]...`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    pub inputs: Vec<String>,
    pub filters: Vec<Filter>,
    pub outputs: Vec<String>,
}

impl Operation {
    pub fn is_overlay_composite(&self) -> bool {
        self.filters
            .iter()
            .any(|f| matches!(f, Filter::Overlay { .. }))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.inputs {
            write!(f, "[{label}]")?;
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{filter}")?;
        }
        for label in &self.outputs {
            write!(f, "[{label}]")?;
        }
        Ok(())
    }
}

/// Where an overlay clip lands inside one base segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlayPlacement {
    pub clip_id: Uuid,
    pub input: usize,
    pub source_start: f64,
    pub source_end: f64,
    /// Seconds from the segment start to the overlay's first frame.
    pub delay: f64,
    /// Seconds of segment left after the overlay's last frame.
    pub pad_after: f64,
}

/// One base clip's contribution to the output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub clip_id: Uuid,
    pub input: usize,
    pub source_start: f64,
    pub source_end: f64,
    pub overlays: Vec<OverlayPlacement>,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.source_end - self.source_start
    }
}

/// A compiled render graph ready for the encoder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderGraph {
    pub inputs: Vec<RenderInput>,
    pub canvas: Canvas,
    pub operations: Vec<Operation>,
    pub segments: Vec<Segment>,
    pub output_video_label: String,
    pub output_audio_label: String,
    /// Output length in seconds.
    pub total_duration: f64,
}

impl RenderGraph {
    /// The graph in ffmpeg `-filter_complex` syntax.
    pub fn filter_complex(&self) -> String {
        self.operations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphOptions {
    pub resolution: Resolution,
    pub overlay_margin: u32,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self::from(&ExportSettings::default())
    }
}

impl From<&ExportSettings> for GraphOptions {
    fn from(settings: &ExportSettings) -> Self {
        Self {
            resolution: settings.resolution,
            overlay_margin: settings.overlay_margin,
        }
    }
}

#[derive(Default)]
struct GraphBuilder {
    inputs: Vec<RenderInput>,
    path_to_index: HashMap<PathBuf, usize>,
    operations: Vec<Operation>,
}

impl GraphBuilder {
    /// Input index for a media file, registering it on first use.
    fn input_for(&mut self, media: &MediaItem) -> usize {
        if let Some(&idx) = self.path_to_index.get(&media.path) {
            return idx;
        }
        let idx = self.inputs.len();
        self.path_to_index.insert(media.path.clone(), idx);
        self.inputs.push(RenderInput {
            path: media.path.clone(),
            index: idx,
        });
        idx
    }

    fn push<I, O>(&mut self, inputs: I, filters: Vec<Filter>, outputs: O)
    where
        I: IntoIterator<Item = String>,
        O: IntoIterator<Item = String>,
    {
        self.operations.push(Operation {
            inputs: inputs.into_iter().collect(),
            filters,
            outputs: outputs.into_iter().collect(),
        });
    }
}

/// Compile base and overlay clips with the default overlay margin.
pub fn compile<M>(
    base_clips: &[TimelineClip],
    overlay_clips: &[TimelineClip],
    media: &M,
    resolution: Resolution,
) -> Result<RenderGraph>
where
    M: MediaLibrary + ?Sized,
{
    let options = GraphOptions {
        resolution,
        ..GraphOptions::default()
    };
    compile_with(base_clips, overlay_clips, media, &options)
}

/// Compile a project's timeline using `settings` for the output shape.
pub fn compile_project(project: &Project, settings: &ExportSettings) -> Result<RenderGraph> {
    let (base, overlays): (Vec<TimelineClip>, Vec<TimelineClip>) = project
        .timeline
        .clips
        .iter()
        .filter(|c| c.track_id == TrackId::BASE || c.track_id == TrackId::OVERLAY)
        .cloned()
        .partition(|c| c.track_id == TrackId::BASE);
    compile_with(&base, &overlays, &project.media, &GraphOptions::from(settings))
}

/// Build the render graph.
///
/// Base clips are concatenated in placement order. Base clips with no
/// trimmed duration or no media are dropped, as are overlays that resolve
/// to no media or do not intersect a base clip. Fails with
/// [`RenderError::NoRenderableContent`] if no base clip survives.
pub fn compile_with<M>(
    base_clips: &[TimelineClip],
    overlay_clips: &[TimelineClip],
    media: &M,
    options: &GraphOptions,
) -> Result<RenderGraph>
where
    M: MediaLibrary + ?Sized,
{
    let mut sorted_base: Vec<&TimelineClip> = base_clips.iter().collect();
    sorted_base.sort_by(|a, b| by_placement(a, b));

    let mut base: Vec<(&TimelineClip, &MediaItem)> = Vec::with_capacity(sorted_base.len());
    for clip in sorted_base {
        if clip.trimmed_duration() <= EPSILON {
            tracing::warn!(clip_id = %clip.id, "skipping base clip with no duration");
            continue;
        }
        match media.media_by_id(clip.media_id) {
            Some(item) => base.push((clip, item)),
            None => {
                tracing::warn!(clip_id = %clip.id, media_id = %clip.media_id, "skipping base clip with missing media")
            }
        }
    }

    if base.is_empty() {
        return Err(RenderError::NoRenderableContent);
    }

    let mut overlays: Vec<&TimelineClip> = overlay_clips.iter().collect();
    overlays.sort_by(|a, b| by_placement(a, b));

    let canvas = Canvas::for_resolution(options.resolution, base.first().map(|(_, m)| *m));
    let mut builder = GraphBuilder::default();
    let mut segments = Vec::with_capacity(base.len());
    let mut total_duration = 0.0;

    for (i, (clip, item)) in base.iter().enumerate() {
        let input = builder.input_for(item);
        let duration = clip.trimmed_duration();
        let window_start = clip.start_time;
        let window_end = clip.start_time + duration;

        let mut video = format!("v{i}");
        builder.push(
            [format!("{input}:v")],
            vec![Filter::Trim {
                start: clip.trim_start,
                end: clip.trim_end,
            }],
            [video.clone()],
        );
        builder.push(
            [format!("{input}:a")],
            vec![
                Filter::AudioTrim {
                    start: clip.trim_start,
                    end: clip.trim_end,
                },
                Filter::Resample {
                    sample_rate: AUDIO_SAMPLE_RATE,
                },
                Filter::Stereo,
            ],
            [format!("a{i}")],
        );

        let mut placements = Vec::new();
        for overlay in &overlays {
            let overlap_start = window_start.max(overlay.start_time);
            let overlap_end = window_end.min(overlay.end_time);
            if overlap_end - overlap_start <= EPSILON {
                continue;
            }
            let Some(overlay_item) = media.media_by_id(overlay.media_id) else {
                tracing::warn!(clip_id = %overlay.id, media_id = %overlay.media_id, "skipping overlay with missing media");
                continue;
            };

            let overlay_input = builder.input_for(overlay_item);
            let source_start = overlay.trim_start + (overlap_start - overlay.start_time);
            let source_end = (source_start + (overlap_end - overlap_start)).min(overlay.trim_end);
            let placement = OverlayPlacement {
                clip_id: overlay.id,
                input: overlay_input,
                source_start,
                source_end,
                delay: overlap_start - window_start,
                pad_after: window_end - overlap_end,
            };

            let j = placements.len();
            let overlay_label = format!("ov{i}_{j}");
            builder.push(
                [format!("{overlay_input}:v")],
                vec![
                    Filter::Trim {
                        start: source_start,
                        end: source_end,
                    },
                    Filter::PixelFormat {
                        format: "yuva420p".to_string(),
                    },
                    Filter::ScaleWidth {
                        width: canvas.overlay_width(),
                    },
                    Filter::TransparentPad {
                        delay: placement.delay,
                        pad_after: placement.pad_after,
                    },
                ],
                [overlay_label.clone()],
            );

            let composited = format!("v{i}_{j}");
            builder.push(
                [video, overlay_label],
                vec![Filter::Overlay {
                    margin: options.overlay_margin,
                }],
                [composited.clone()],
            );
            video = composited;
            placements.push(placement);
        }

        builder.push(
            [video],
            vec![
                Filter::Fit {
                    width: canvas.width,
                    height: canvas.height,
                },
                Filter::Fps { fps: OUTPUT_FPS },
                Filter::PixelFormat {
                    format: "yuv420p".to_string(),
                },
            ],
            [format!("s{i}")],
        );

        total_duration += duration;
        segments.push(Segment {
            clip_id: clip.id,
            input,
            source_start: clip.trim_start,
            source_end: clip.trim_end,
            overlays: placements,
        });
    }

    let concat_inputs: Vec<String> = (0..segments.len())
        .flat_map(|i| [format!("s{i}"), format!("a{i}")])
        .collect();
    builder.push(
        concat_inputs,
        vec![Filter::Concat {
            segments: segments.len(),
        }],
        ["cv".to_string(), OUTPUT_AUDIO_LABEL.to_string()],
    );
    builder.push(
        ["cv".to_string()],
        vec![Filter::PixelFormat {
            format: "yuv420p".to_string(),
        }],
        [OUTPUT_VIDEO_LABEL.to_string()],
    );

    tracing::debug!(
        segments = segments.len(),
        inputs = builder.inputs.len(),
        total_duration,
        %canvas,
        "compiled render graph"
    );

    Ok(RenderGraph {
        inputs: builder.inputs,
        canvas,
        operations: builder.operations,
        segments,
        output_video_label: OUTPUT_VIDEO_LABEL.to_string(),
        output_audio_label: OUTPUT_AUDIO_LABEL.to_string(),
        total_duration,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
