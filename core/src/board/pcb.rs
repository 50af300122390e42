use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::path::Path;

use crate::board::sexpr::{self, Sexpr};
use crate::prelude::{ToolError, ToolResult};
use crate::telemetry::log::LogManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Segment,
    Arc,
    Via,
}

/// One copper track item with its routed length in millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub kind: TrackKind,
    pub net: u32,
    pub layer: Option<String>,
    pub length_mm: f64,
}

/// Nets and tracks of a KiCad board file.
#[derive(Debug, Clone, Default)]
pub struct Board {
    pub nets: BTreeMap<u32, String>,
    pub tracks: Vec<Track>,
}

type Point = (f64, f64);

impl Board {
    pub fn load(path: &Path) -> ToolResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            ToolError::InvalidInput(format!("reading board {}: {}", path.display(), err))
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> ToolResult<Self> {
        let root = sexpr::parse(text)?;
        if root.head() != Some("kicad_pcb") {
            return Err(ToolError::InvalidInput(
                "not a KiCad board: top-level list is not kicad_pcb".into(),
            ));
        }

        let mut board = Board::default();
        for net in root.children("net") {
            let code = net
                .arg(0)
                .and_then(Sexpr::as_f64)
                .ok_or_else(|| ToolError::InvalidInput("net declaration without code".into()))?;
            let name = net.arg(1).and_then(Sexpr::as_text).unwrap_or_default();
            board.nets.insert(code as u32, name.to_string());
        }

        for item in root.items() {
            let kind = match item.head() {
                Some("segment") => TrackKind::Segment,
                Some("arc") => TrackKind::Arc,
                Some("via") => TrackKind::Via,
                _ => continue,
            };
            let net = board.track_net(item)?;
            let length_mm = match kind {
                TrackKind::Segment => distance(point(item, "start")?, point(item, "end")?),
                TrackKind::Arc => arc_length(
                    point(item, "start")?,
                    point(item, "mid")?,
                    point(item, "end")?,
                ),
                TrackKind::Via => 0.0,
            };
            let layer = item
                .child("layer")
                .and_then(|layer| layer.arg(0))
                .and_then(Sexpr::as_text)
                .map(str::to_string);
            board.tracks.push(Track {
                kind,
                net,
                layer,
                length_mm,
            });
        }

        LogManager::new("length-match").record(&format!(
            "board has {} nets and {} track items",
            board.nets.len(),
            board.tracks.len()
        ));
        Ok(board)
    }

    /// Resolves `(net N)` or `(net "name")`; unknown names get a fresh code.
    fn track_net(&mut self, item: &Sexpr) -> ToolResult<u32> {
        let net = item
            .child("net")
            .and_then(|net| net.arg(0))
            .ok_or_else(|| ToolError::InvalidInput("track without net".into()))?;
        match net {
            Sexpr::Atom(_) => net
                .as_f64()
                .map(|code| code as u32)
                .ok_or_else(|| ToolError::InvalidInput("track net is not a number".into())),
            Sexpr::Str(name) => {
                if let Some((&code, _)) = self.nets.iter().find(|(_, n)| *n == name) {
                    return Ok(code);
                }
                let code = self.nets.keys().next_back().map_or(0, |last| last + 1);
                self.nets.insert(code, name.clone());
                Ok(code)
            }
            Sexpr::List(_) => Err(ToolError::InvalidInput("malformed track net".into())),
        }
    }

    pub fn net_name(&self, code: u32) -> Option<&str> {
        self.nets.get(&code).map(String::as_str)
    }

    /// Summed length of every track item on the net.
    pub fn net_length(&self, code: u32) -> f64 {
        self.tracks
            .iter()
            .filter(|track| track.net == code)
            .map(|track| track.length_mm)
            .sum()
    }

    /// Nets that own at least one track item, by code.
    pub fn routed_nets(&self) -> BTreeMap<u32, &str> {
        self.tracks
            .iter()
            .filter_map(|track| self.net_name(track.net).map(|name| (track.net, name)))
            .collect()
    }
}

fn point(item: &Sexpr, name: &str) -> ToolResult<Point> {
    let node = item
        .child(name)
        .ok_or_else(|| ToolError::InvalidInput(format!("track item without {}", name)))?;
    match (node.arg(0).and_then(Sexpr::as_f64), node.arg(1).and_then(Sexpr::as_f64)) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(ToolError::InvalidInput(format!("malformed {} point", name))),
    }
}

fn distance(a: Point, b: Point) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

/// Length of the circular arc from `start` through `mid` to `end`.
pub fn arc_length(start: Point, mid: Point, end: Point) -> f64 {
    let (ax, ay) = start;
    let (bx, by) = mid;
    let (cx, cy) = end;
    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < 1e-12 {
        return distance(start, end);
    }

    let a2 = ax * ax + ay * ay;
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
    let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;
    let radius = distance((ux, uy), start);

    let angle = |p: Point| (p.1 - uy).atan2(p.0 - ux);
    let ccw = |from: f64, to: f64| (to - from).rem_euclid(TAU);
    let to_end = ccw(angle(start), angle(end));
    let to_mid = ccw(angle(start), angle(mid));
    let sweep = if to_mid <= to_end { to_end } else { TAU - to_end };
    radius * sweep
}
