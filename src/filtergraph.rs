//! Filter-graph descriptions for shot masks, missing-media cards and slates.
//!
//! Everything here is pure string construction. Sizes are derived from the output frame
//! height so the same description stays legible at any frame size.
//!
//! Text reaches the renderer through three parsers, each with its own escaping: drawtext
//! expansion (`%`), option parsing (`:`) and graph parsing (`,;[]`). [`escape_text`] and
//! [`escape_option`] apply them in that order.

use std::path::{Path, PathBuf};

use crate::foundation::core::FrameSize;

const SLATE_COLOR: &str = "DarkSlateGray";
const MISSING_MEDIA_COLOR: &str = "red";
const TEXT_COLOR: &str = "white";

fn backslash_escape(s: &str, specials: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || specials.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escapes an option value so it survives option and graph parsing unchanged.
pub fn escape_option(s: &str) -> String {
    let option_level = backslash_escape(s, &['\'', ':']);
    backslash_escape(&option_level, &['\'', '[', ']', ',', ';'])
}

/// Escapes literal drawtext content (no `%{...}` expansion survives).
pub fn escape_text(s: &str) -> String {
    escape_option(&backslash_escape(s, &['%']))
}

fn px(v: f64) -> u32 {
    v.round().max(1.0) as u32
}

fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v:.3}")
    }
}

/// Shot-mask geometry for one frame height. The reference values are those at 1080 lines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskLayout {
    pub band_height: u32,
    pub padding: u32,
    pub font_large: u32,
    pub font_small: u32,
    pub logo_height: u32,
    pub logo_offset: u32,
}

impl MaskLayout {
    pub fn for_height(height: u32) -> Self {
        let h = f64::from(height);
        let band = h * 60.0 / 1080.0;
        Self {
            band_height: px(band),
            padding: px(h * 25.0 / 1080.0),
            font_large: px(h * 25.0 / 1080.0),
            font_small: px(h * 16.0 / 1080.0),
            logo_height: px(band - band / 6.0),
            logo_offset: px(band / 12.0),
        }
    }
}

/// Geometry shared by the full-frame cards (slate and missing media).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardLayout {
    pub grid: f64,
    pub font_title: u32,
    pub font_subtitle: u32,
    pub font_text: u32,
    pub logo_height: u32,
    pub logo_padding: u32,
    pub leading: f64,
    pub text_x: u32,
    pub text_y: u32,
}

impl CardLayout {
    pub fn for_height(height: u32) -> Self {
        let h = f64::from(height);
        let grid = h / 5.0;
        let logo = grid / 1.5;
        let logo_padding = grid / 2.0;
        let offset = logo + logo_padding * 2.0;
        Self {
            grid,
            font_title: px(h / 15.0),
            font_subtitle: px(h / 35.0),
            font_text: px(h / 45.0),
            logo_height: px(logo),
            logo_padding: px(logo_padding),
            leading: grid / 20.0,
            text_x: px(offset),
            text_y: px(offset),
        }
    }
}

fn drawtext(font_file: Option<&Path>, fontsize: u32, content: &str, x: &str, y: &str) -> String {
    let mut s = String::from("drawtext=");
    if let Some(font) = font_file {
        let font = font.to_string_lossy().replace('\\', "/");
        s.push_str(&format!("fontfile={}:", escape_option(&font)));
    }
    s.push_str(&format!(
        "fontsize={fontsize}:fontcolor={TEXT_COLOR}:{content}:x={x}:y={y}"
    ));
    s
}

fn text(s: &str) -> String {
    format!("text={}", escape_text(s))
}

/// Which overlay a [`ShotMask`] draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskMode {
    /// Full per-clip mask: bands, pass, shot, date, frame counter, file name, logo.
    Clip,
    /// A single running timecode, drawn once over the concatenated sequence.
    Sequence,
    /// Scale and pad to the output frame only.
    ResizeOnly,
}

/// Burned-in identification overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct ShotMask {
    pub mode: MaskMode,
    pub frame_size: FrameSize,
    pub fps: f64,
    pub opacity: f64,
    /// The logo is expected as input `[1:v]` (clip mode only).
    pub has_logo: bool,
    pub pass_name: String,
    pub shot_name: String,
    pub file_name: String,
    pub date: String,
    /// Value of the frame counter on the first output frame.
    pub start_frame: u32,
    pub missing_frame_color: String,
    pub letterbox_color: String,
    pub font_file: Option<PathBuf>,
}

impl ShotMask {
    pub fn new(mode: MaskMode, frame_size: FrameSize, fps: f64) -> Self {
        Self {
            mode,
            frame_size,
            fps,
            opacity: 0.2,
            has_logo: false,
            pass_name: String::new(),
            shot_name: String::new(),
            file_name: String::new(),
            date: String::new(),
            start_frame: 0,
            missing_frame_color: "orange".to_string(),
            letterbox_color: "black".to_string(),
            font_file: None,
        }
    }

    /// Scale+pad of `[0:v]` over a solid background, left as `[sized]`.
    fn size_chain(&self) -> String {
        let FrameSize { width, height } = self.frame_size;
        format!(
            "[0:v]scale=w={width}:h={height}:force_original_aspect_ratio=decrease,\
             pad=width={width}:height={height}:x=-1:y=-1:color={lb}[fit];\
             color=c={bg}:s={size}:r={fps}[bg];\
             [bg][fit]overlay=eof_action=pass",
            lb = self.letterbox_color,
            bg = self.missing_frame_color,
            size = self.frame_size.lavfi(),
            fps = fmt_num(self.fps),
        )
    }

    fn clip_texts(&self, layout: &MaskLayout) -> Vec<String> {
        let font = self.font_file.as_deref();
        let m = layout.band_height;
        let p = layout.padding;
        vec![
            drawtext(
                font,
                layout.font_small,
                &text(&self.pass_name),
                "(w-text_w)/2",
                &format!("({m}/2)-(text_h/2)"),
            ),
            drawtext(
                font,
                layout.font_large,
                &text(&self.shot_name),
                &format!("w-text_w-{p}"),
                &format!("({m}/2)-(text_h/2)"),
            ),
            drawtext(
                font,
                layout.font_small,
                &text(&self.date),
                &p.to_string(),
                &format!("h-(text_h/2)-({m}/3)"),
            ),
            drawtext(
                font,
                layout.font_large,
                &format!("text=%{{frame_num}}:start_number={}", self.start_frame),
                &format!("w-text_w-{p}"),
                &format!("h-(text_h/2)-({m}/2)"),
            ),
            drawtext(
                font,
                layout.font_small,
                &text(&self.file_name),
                &p.to_string(),
                &format!("h-(text_h/2)-(({m}/3)*2)"),
            ),
        ]
    }

    fn sequence_text(&self, layout: &MaskLayout) -> String {
        drawtext(
            self.font_file.as_deref(),
            layout.font_small,
            &format!(
                "timecode={}:rate={}",
                escape_option("00:00:00:00"),
                fmt_num(self.fps)
            ),
            "(w-text_w)/2",
            &format!("h-(text_h/2)-({}/2)", layout.band_height),
        )
    }

    /// The graph description for this mask's mode.
    ///
    /// Clip and resize-only graphs read the source from `[0:v]`. The sequence graph is a
    /// bare filter chain meant to be appended after a concatenation.
    pub fn filter_graph(&self) -> String {
        let layout = MaskLayout::for_height(self.frame_size.height);
        match self.mode {
            MaskMode::ResizeOnly => self.size_chain(),
            MaskMode::Sequence => self.sequence_text(&layout),
            MaskMode::Clip => {
                let mut graph = self.size_chain();
                if self.has_logo {
                    graph.push_str(&format!(
                        "[sized];[1:v]scale=w=-1:h={lh}[logo];\
                         [sized][logo]overlay=x={p}:y={lo}",
                        lh = layout.logo_height,
                        p = layout.padding,
                        lo = layout.logo_offset,
                    ));
                }
                let m = layout.band_height;
                let band = format!("black@{}", fmt_num(self.opacity));
                graph.push_str(&format!(
                    "[masked];[masked]drawbox=x=0:y=0:w=iw:h={m}:color={band}:t=fill,\
                     drawbox=x=0:y=ih-{m}:w=iw:h={m}:color={band}:t=fill"
                ));
                for t in self.clip_texts(&layout) {
                    graph.push(',');
                    graph.push_str(&t);
                }
                graph
            }
        }
    }
}

/// Solid warning card standing in for footage that could not be resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct MissingMediaCard {
    pub frame_size: FrameSize,
    pub fps: f64,
    pub name: String,
    pub font_file: Option<PathBuf>,
}

impl MissingMediaCard {
    pub fn title(&self) -> String {
        format!("Missing Media {}", self.name)
    }

    /// Source-only graph; the request needs no inputs.
    pub fn filter_graph(&self) -> String {
        let layout = CardLayout::for_height(self.frame_size.height);
        format!(
            "color=c={MISSING_MEDIA_COLOR}:s={size}:r={fps}[bg];[bg]{title}",
            size = self.frame_size.lavfi(),
            fps = fmt_num(self.fps),
            title = drawtext(
                self.font_file.as_deref(),
                layout.font_title,
                &text(&self.title()),
                &layout.text_x.to_string(),
                &layout.text_y.to_string(),
            ),
        )
    }
}

/// Title card with notes and a countdown.
#[derive(Clone, Debug, PartialEq)]
pub struct SlateCard {
    pub frame_size: FrameSize,
    pub fps: f64,
    pub title: String,
    pub pass_name: String,
    pub date: String,
    pub notes: Vec<String>,
    /// Seconds; the countdown runs from here to zero.
    pub duration: f64,
    /// The logo is expected as input `[0:v]`.
    pub has_logo: bool,
    pub font_file: Option<PathBuf>,
}

impl SlateCard {
    pub fn filter_graph(&self) -> String {
        let layout = CardLayout::for_height(self.frame_size.height);
        let font = self.font_file.as_deref();
        let FrameSize { width, height } = self.frame_size;
        let x = layout.text_x.to_string();
        let mut y = f64::from(layout.text_y);

        let mut graph = format!(
            "color=c={SLATE_COLOR}:s={size}:r={fps}",
            size = self.frame_size.lavfi(),
            fps = fmt_num(self.fps),
        );
        if self.has_logo {
            graph.push_str(&format!(
                "[bg];[0:v]scale=w=-1:h={lh}[logo];[bg][logo]overlay=x={lp}:y={lp}",
                lh = layout.logo_height,
                lp = layout.logo_padding,
            ));
        }
        graph.push_str("[card];[card]");

        let mut texts = vec![drawtext(
            font,
            layout.font_title,
            &text(&self.title),
            &x,
            &px(y).to_string(),
        )];
        y += f64::from(layout.font_title) + layout.leading;
        texts.push(drawtext(
            font,
            layout.font_subtitle,
            &text(&format!("work in progress: {}", self.pass_name)),
            &x,
            &px(y).to_string(),
        ));
        y += f64::from(layout.font_subtitle) + layout.leading;
        texts.push(drawtext(
            font,
            layout.font_text,
            &text(&self.date),
            &x,
            &px(y).to_string(),
        ));
        y += f64::from(layout.font_text) + layout.leading * 5.0;
        for note in &self.notes {
            texts.push(drawtext(
                font,
                layout.font_text,
                &text(&format!("- {note}")),
                &x,
                &px(y).to_string(),
            ));
            y += f64::from(layout.font_text) + layout.leading;
        }

        let inset = px(layout.grid / 2.0);
        texts.push(drawtext(
            font,
            layout.font_title,
            &format!(
                "text={}",
                escape_option(&format!("%{{eif:{}-t:d}}", fmt_num(self.duration)))
            ),
            &format!("{}-text_w-{inset}", width),
            &format!("{}-text_h-{inset}", height),
        ));

        graph.push_str(&texts.join(","));
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_mask() -> ShotMask {
        ShotMask {
            pass_name: "Animation".to_string(),
            shot_name: "S010".to_string(),
            file_name: "S010_v003.mp4".to_string(),
            date: "2024-05-01".to_string(),
            start_frame: 2,
            ..ShotMask::new(MaskMode::Clip, FrameSize::default(), 30.0)
        }
    }

    #[test]
    fn escaping_layers() {
        assert_eq!(escape_option("a:b"), "a\\\\:b");
        assert_eq!(escape_option("a,b"), "a\\,b");
        assert_eq!(escape_text("100%"), "100\\\\\\\\%");
        assert_eq!(escape_text("plain text"), "plain text");
    }

    #[test]
    fn layout_scales_with_height() {
        let full = MaskLayout::for_height(1080);
        let half = MaskLayout::for_height(540);
        assert_eq!(full.band_height, 60);
        assert_eq!(half.band_height, 30);
        assert_eq!(full.font_large, 25);
        assert_eq!(half.font_small, 8);
        assert!(CardLayout::for_height(2160).font_title > CardLayout::for_height(1080).font_title);
    }

    #[test]
    fn clip_mask_burns_in_identification() {
        let g = clip_mask().filter_graph();
        assert!(g.starts_with("[0:v]scale=w=1920:h=1080"));
        assert!(g.contains("color=c=orange:s=1920x1080:r=30"));
        assert!(g.contains("text=Animation"));
        assert!(g.contains("text=S010"));
        assert!(g.contains("text=2024-05-01"));
        assert!(g.contains("text=%{frame_num}:start_number=2"));
        assert!(g.contains("text=S010_v003.mp4"));
        assert_eq!(g.matches("drawbox").count(), 2);
        assert!(!g.contains("[1:v]"));
    }

    #[test]
    fn clip_mask_with_logo_reads_second_input() {
        let mask = ShotMask {
            has_logo: true,
            ..clip_mask()
        };
        let g = mask.filter_graph();
        assert!(g.contains("[1:v]scale=w=-1:h=50[logo]"));
        assert!(g.contains("[sized][logo]overlay"));
    }

    #[test]
    fn resize_only_has_no_text() {
        let mask = ShotMask {
            mode: MaskMode::ResizeOnly,
            ..clip_mask()
        };
        let g = mask.filter_graph();
        assert!(g.contains("pad=width=1920:height=1080"));
        assert!(!g.contains("drawtext"));
        assert!(!g.contains("drawbox"));
    }

    #[test]
    fn sequence_mask_is_single_timecode() {
        let g = ShotMask::new(MaskMode::Sequence, FrameSize::default(), 25.0).filter_graph();
        assert!(g.starts_with("drawtext="));
        assert!(g.contains("rate=25"));
        assert_eq!(g.matches("drawtext").count(), 1);
    }

    #[test]
    fn missing_media_card_names_the_shot() {
        let card = MissingMediaCard {
            frame_size: FrameSize::new(1280, 720).unwrap(),
            fps: 24.0,
            name: "S070".to_string(),
            font_file: Some(PathBuf::from("C:\\Windows\\fonts\\consola.ttf")),
        };
        let g = card.filter_graph();
        assert!(g.starts_with("color=c=red:s=1280x720:r=24[bg]"));
        assert!(g.contains("text=Missing Media S070"));
        assert!(g.contains("fontfile=C\\\\:/Windows/fonts/consola.ttf"));
    }

    #[test]
    fn slate_card_lists_notes_and_counts_down() {
        let card = SlateCard {
            frame_size: FrameSize::default(),
            fps: 30.0,
            title: "Dailies".to_string(),
            pass_name: "Animation".to_string(),
            date: "24-05-01".to_string(),
            notes: vec!["size: 1920 x 1080".to_string(), "fps: 30".to_string()],
            duration: 5.0,
            has_logo: true,
            font_file: None,
        };
        let g = card.filter_graph();
        assert!(g.starts_with("color=c=DarkSlateGray"));
        assert!(g.contains("[0:v]scale=w=-1"));
        assert!(g.contains("text=Dailies"));
        assert!(g.contains("work in progress\\\\: Animation"));
        assert!(g.contains("text=- size\\\\: 1920 x 1080"));
        assert!(g.contains("%{eif\\\\:5-t\\\\:d}"));
    }
}
