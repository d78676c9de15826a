use sheet_schema::Sheet;

/// Chart persistence. Calls are synchronous from the session's point of view.
pub trait SheetStore {
    fn save(&mut self, name: &str, sheet: &Sheet) -> anyhow::Result<()>;

    fn load(&self, name: &str) -> anyhow::Result<Sheet>;

    fn load_demo(&self, name: &str) -> anyhow::Result<Sheet>;
}
