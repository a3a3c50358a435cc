// Scripted input routes for headless runs.
//
// A route is a comma-separated list of segments, replayed cyclically, one
// `InputFrame` per tick:
//
//   KEYS[:N]
//
// KEYS is any combination of `w`, `a`, `s`, `d` (held for N frames, default
// 1), or one of the one-shot keys `e` (interact), `b` (toggle backpack),
// `x` (close backpack), or `.` (idle). A one-shot segment fires on its first
// frame only; the remaining N-1 frames are idle.
//
// Example: `d:120,e,.:10,e,e` walks east for 120 frames, interacts, waits
// ten frames, then interacts twice.
//
// See also: `main.rs` for the `run` subcommand that consumes routes.

use anyhow::{Context, Result, bail};
use scarcely_sim::command::InputFrame;

#[derive(Clone, Debug, PartialEq)]
struct Segment {
    held: Vec<&'static str>,
    pressed: Vec<&'static str>,
    frames: usize,
}

/// A parsed route. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    segments: Vec<Segment>,
    period: usize,
}

impl Route {
    pub fn parse(script: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for raw in script.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (keys, frames) = match raw.split_once(':') {
                Some((keys, count)) => {
                    let frames: usize = count
                        .trim()
                        .parse()
                        .with_context(|| format!("bad frame count in route segment {raw:?}"))?;
                    (keys.trim(), frames)
                }
                None => (raw, 1),
            };
            if frames == 0 {
                bail!("route segment {raw:?} has zero frames");
            }
            segments.push(parse_keys(keys, raw, frames)?);
        }
        if segments.is_empty() {
            bail!("route is empty");
        }
        let period = segments.iter().map(|s| s.frames).sum();
        Ok(Self { segments, period })
    }

    /// Frames in one pass of the route.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Input for tick `tick`, wrapping around the route.
    pub fn frame(&self, tick: usize) -> InputFrame {
        let mut offset = tick % self.period;
        for segment in &self.segments {
            if offset < segment.frames {
                let pressed: &[&str] = if offset == 0 { &segment.pressed } else { &[] };
                return InputFrame::from_keys(
                    segment.held.iter().copied(),
                    pressed.iter().copied(),
                );
            }
            offset -= segment.frames;
        }
        InputFrame::default()
    }
}

impl Default for Route {
    /// Stand still.
    fn default() -> Self {
        Self {
            segments: vec![Segment {
                held: Vec::new(),
                pressed: Vec::new(),
                frames: 1,
            }],
            period: 1,
        }
    }
}

fn parse_keys(keys: &str, raw: &str, frames: usize) -> Result<Segment> {
    let mut segment = Segment {
        held: Vec::new(),
        pressed: Vec::new(),
        frames,
    };
    match keys {
        "e" => segment.pressed.push("e"),
        "b" => segment.pressed.push("b"),
        "x" => segment.pressed.push("escape"),
        "." => {}
        _ => {
            for key in keys.chars() {
                let held = match key {
                    'w' => "w",
                    'a' => "a",
                    's' => "s",
                    'd' => "d",
                    other => bail!("unknown key {other:?} in route segment {raw:?}"),
                };
                segment.held.push(held);
            }
        }
    }
    Ok(segment)
}
