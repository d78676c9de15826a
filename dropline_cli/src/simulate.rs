use dropline_core::time::PlaybackStart;
use dropline_core::SessionConfig;
use sheet_schema::{Seconds, Song};

use crate::headless::{Rig, TallySurface};

#[derive(Debug, Clone, Copy)]
pub struct SimulateOptions {
    pub fps: u32,
    /// Added to every autoplay press, in seconds. Negative presses early.
    pub offset: Seconds,
    /// Skip every n-th note so it scrolls past as a miss.
    pub miss_every: Option<usize>,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            fps: 60,
            offset: 0.0,
            miss_every: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaneRow {
    pub lane: usize,
    pub key: String,
    pub notes: usize,
    pub hits: u32,
    pub misses: u32,
}

#[derive(Debug)]
pub struct SimulationReport {
    pub start: Option<PlaybackStart>,
    pub rows: Vec<LaneRow>,
    pub frames: usize,
    pub note_draws: usize,
}

impl SimulationReport {
    pub fn total_notes(&self) -> usize {
        self.rows.iter().map(|r| r.notes).sum()
    }

    pub fn total_hits(&self) -> u32 {
        self.rows.iter().map(|r| r.hits).sum()
    }

    pub fn total_misses(&self) -> u32 {
        self.rows.iter().map(|r| r.misses).sum()
    }

    pub fn print(&self) {
        match &self.start {
            Some(PlaybackStart::Failed(e)) => println!("playback: failed ({})", e),
            Some(start) => println!("playback: {:?}", start),
            None => println!("playback: never started"),
        }
        println!("lane | key | notes | hit | miss");
        println!("-----|-----|-------|-----|-----");
        for row in &self.rows {
            println!(
                "{:4} | {:3} | {:5} | {:3} | {:4}",
                row.lane, row.key, row.notes, row.hits, row.misses
            );
        }
        println!(
            "total: {} notes, {} hit, {} miss ({} frames, {} note draws)",
            self.total_notes(),
            self.total_hits(),
            self.total_misses(),
            self.frames,
            self.note_draws
        );
    }
}

pub fn run_simulation(
    config: SessionConfig,
    song: Song,
    options: SimulateOptions,
) -> anyhow::Result<SimulationReport> {
    if options.fps == 0 {
        anyhow::bail!("--fps must be at least 1");
    }
    let dt = 1.0 / options.fps as Seconds;
    let sheet = song.sheet.clone();
    let mut rig = Rig::new(config);
    rig.session.start_song(song)?;
    let lead = rig.session.session().lead_time_seconds;

    // Session-time press schedule, earliest first.
    let mut presses: Vec<(Seconds, &str)> = sheet
        .events()
        .iter()
        .enumerate()
        .filter(|(i, _)| match options.miss_every {
            Some(n) if n > 0 => (i + 1) % n != 0,
            _ => true,
        })
        .map(|(_, e)| (e.time + lead + options.offset, e.key.as_str()))
        .collect();
    presses.sort_by(|a, b| a.0.total_cmp(&b.0));

    let tolerance = rig.session.config().hit_tolerance_seconds;
    let deadline = rig.now() + lead + sheet.duration() + options.offset.max(0.0) + tolerance + 2.0;
    let mut surface = TallySurface::default();
    let mut next = 0;

    loop {
        rig.advance(dt)?;
        let elapsed = rig.session.elapsed_play_time();
        while let Some((_, key)) = presses.get(next).filter(|(at, _)| *at <= elapsed) {
            rig.key_down(key)?;
            next += 1;
        }
        rig.session.frame(&mut surface);

        let drained = rig.session.lanes().iter().all(|lane| lane.pending_len() == 0);
        if (drained && next == presses.len()) || rig.now() > deadline {
            break;
        }
    }

    let start = rig.session.last_start().cloned();
    let rows = rig
        .session
        .lanes()
        .iter()
        .enumerate()
        .map(|(lane, l)| LaneRow {
            lane,
            key: l.key().to_string(),
            notes: sheet.for_key(l.key()).count(),
            hits: l.stats().hits,
            misses: l.stats().misses,
        })
        .collect();
    rig.session.stop();

    Ok(SimulationReport {
        start,
        rows,
        frames: surface.frames,
        note_draws: surface.notes_drawn,
    })
}
