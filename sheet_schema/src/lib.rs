use serde::{Deserialize, Serialize};

pub type Seconds = f64;

/// One timestamped key press. `time` is the media playback position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SheetEvent {
    pub time: Seconds,
    pub key: String,
}

impl SheetEvent {
    pub fn new(time: Seconds, key: impl Into<String>) -> Self {
        Self {
            time,
            key: key.into(),
        }
    }
}

/// Ordered list of key events defining a playable song.
///
/// Times are expected to be non-decreasing but this is not enforced; a sheet
/// being recorded only ever grows at the end.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Sheet {
    events: Vec<SheetEvent>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SheetEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[SheetEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Events bound to `key`, paired with their index in the whole sheet.
    pub fn for_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = (usize, &'a SheetEvent)> + 'a {
        self.events
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.key == key)
    }

    pub fn is_time_ordered(&self) -> bool {
        self.events.windows(2).all(|w| w[0].time <= w[1].time)
    }

    /// Time of the last event, or 0 for an empty sheet.
    pub fn duration(&self) -> Seconds {
        self.events.iter().map(|e| e.time).fold(0.0, f64::max)
    }
}

impl From<Vec<SheetEvent>> for Sheet {
    fn from(events: Vec<SheetEvent>) -> Self {
        Self { events }
    }
}

impl FromIterator<SheetEvent> for Sheet {
    fn from_iter<I: IntoIterator<Item = SheetEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceMode {
    #[default]
    #[serde(rename = "url")]
    Url,

    #[serde(rename = "embeddedVideo", alias = "youtube")]
    EmbeddedVideo,
}

/// Everything needed to start a play session for one song.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub src_mode: SourceMode,
    #[serde(default, alias = "youtubeId")]
    pub video_id: Option<String>,
    #[serde(default, alias = "visualizerNo")]
    pub visualizer: Option<u32>,
    #[serde(default)]
    pub sheet: Sheet,
    /// Overrides the configured lead time for this song.
    #[serde(default)]
    pub lead_time_seconds: Option<Seconds>,
}

impl Song {
    pub fn from_sheet(sheet: Sheet) -> Self {
        Self {
            sheet,
            ..Self::default()
        }
    }
}
