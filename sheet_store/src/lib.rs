use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use dropline_core::store::SheetStore;
use log::debug;
use sheet_schema::{Sheet, Song};

const SHEET_EXTENSION: &str = "sheet.json";

const DEMOS: &[(&str, &str)] = &[
    ("first_steps", include_str!("../demos/first_steps.json")),
    ("stairs", include_str!("../demos/stairs.json")),
];

pub fn load_sheet_json_from_path(path: impl AsRef<Path>) -> anyhow::Result<Sheet> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("failed to read sheet: {}", path.display()))?;
    let sheet: Sheet = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse sheet json: {}", path.display()))?;
    Ok(sheet)
}

pub fn load_sheet_json_from_str(json: &str) -> anyhow::Result<Sheet> {
    let sheet: Sheet = serde_json::from_str(json).context("failed to parse sheet json")?;
    Ok(sheet)
}

pub fn load_song_json_from_path(path: impl AsRef<Path>) -> anyhow::Result<Song> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("failed to read song: {}", path.display()))?;
    let song: Song = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse song json: {}", path.display()))?;
    Ok(song)
}

/// Built-in sheets shipped with the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoBank;

impl DemoBank {
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        DEMOS.iter().map(|(name, _)| *name)
    }

    pub fn get(&self, name: &str) -> anyhow::Result<Sheet> {
        let Some((_, json)) = DEMOS.iter().find(|(n, _)| *n == name) else {
            bail!("unknown demo: {}", name);
        };
        load_sheet_json_from_str(json).with_context(|| format!("demo {} is corrupt", name))
    }
}

/// Sheets stored as `<name>.sheet.json` files in one directory.
#[derive(Debug, Clone)]
pub struct JsonSheetStore {
    dir: PathBuf,
    demos: DemoBank,
}

impl JsonSheetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            demos: DemoBank,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> anyhow::Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            bail!("invalid sheet name: {:?}", name);
        }
        Ok(self.dir.join(format!("{}.{}", name, SHEET_EXTENSION)))
    }

    /// Names of every stored sheet, sorted.
    pub fn list(&self) -> anyhow::Result<Vec<String>> {
        let suffix = format!(".{}", SHEET_EXTENSION);
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to list: {}", self.dir.display()))
            }
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            if let Some(name) = file_name.to_str().and_then(|n| n.strip_suffix(&suffix)) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl SheetStore for JsonSheetStore {
    fn save(&mut self, name: &str, sheet: &Sheet) -> anyhow::Result<()> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create: {}", self.dir.display()))?;
        let json = serde_json::to_string_pretty(sheet).context("failed to serialize sheet")?;
        fs::write(&path, json).with_context(|| format!("failed to write: {}", path.display()))?;
        debug!("saved {} events to {}", sheet.len(), path.display());
        Ok(())
    }

    fn load(&self, name: &str) -> anyhow::Result<Sheet> {
        load_sheet_json_from_path(self.path_for(name)?)
    }

    fn load_demo(&self, name: &str) -> anyhow::Result<Sheet> {
        self.demos.get(name)
    }
}
