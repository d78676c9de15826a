use anyhow::{bail, Context};
use dropline_core::SessionConfig;
use log::info;
use sheet_schema::{Seconds, Sheet, Song};

use crate::headless::Rig;

/// Parses `"0.5:d,1.2:f"` into `(media time, key)` pairs.
pub fn parse_presses(text: &str) -> anyhow::Result<Vec<(Seconds, String)>> {
    let mut presses = Vec::new();
    for item in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((time, key)) = item.split_once(':') else {
            bail!("press {:?} must look like <seconds>:<key>", item);
        };
        let time: Seconds = time
            .trim()
            .parse()
            .with_context(|| format!("invalid press time in {:?}", item))?;
        if !time.is_finite() || time < 0.0 {
            bail!("press time must be a non-negative number: {:?}", item);
        }
        let key = key.trim();
        if key.is_empty() {
            bail!("press {:?} has no key", item);
        }
        presses.push((time, key.to_string()));
    }
    Ok(presses)
}

/// Plays `song` in recording mode and presses each key when the media
/// reaches its time. Returns the recorded sheet.
pub fn run_recording(
    config: SessionConfig,
    song: Song,
    mut presses: Vec<(Seconds, String)>,
    fps: u32,
) -> anyhow::Result<Sheet> {
    if fps == 0 {
        bail!("--fps must be at least 1");
    }
    let dt = 1.0 / fps as Seconds;
    let mut rig = Rig::new(config);
    rig.session.start_recording(song)?;
    let lead = rig.session.session().lead_time_seconds;
    let live_at = rig.run_count_in(dt, lead + 5.0)?;

    presses.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (time, key) in &presses {
        let wait = live_at + time - rig.now();
        if wait > 0.0 {
            rig.advance(wait)?;
        }
        rig.key_down(key)?;
    }
    rig.session.stop();

    let sheet = rig.session.sheet();
    info!("recorded {} of {} presses", sheet.len(), presses.len());
    Ok(sheet)
}
