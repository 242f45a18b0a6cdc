//! Opens every store of a profile and drives whole-profile export/import.
//!
//! Opening never gives up on a damaged file: the file is renamed to `*.bad`
//! and recreated, and when even that fails the store lives in memory for the
//! session. What went wrong is collected for [`ConfigProvider::problems`].

use crate::db::Location;
use crate::error::Result;
use crate::guid::{guid_to_string, parse_guid};
use crate::history::HistoryStore;
use crate::lock::ProfileLock;
use crate::migrate;
use crate::options::ProviderOptions;
use crate::traits::{Exportable, Transactional};
use crate::vault::{
    associations, colors, flat, hotkeys, AssociationStore, ColorStore, FlatStore, HierarchicalStore,
    HighlightBlobs, HotkeyStore, PluginCacheStore,
};
use anyhow::Context;
use cfgvault_repr::{Document, Element};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};
use uuid::Uuid;

pub const GENERAL_DB: &str = "generalconfig.db";
pub const LOCAL_DB: &str = "localconfig.db";
pub const COLORS_DB: &str = "colors.db";
pub const ASSOCIATIONS_DB: &str = "associations.db";
pub const PLUGIN_CACHE_DB: &str = "plugincache.db";
pub const HOTKEYS_DB: &str = "pluginhotkeys.db";
pub const HISTORY_DB: &str = "history.db";
pub const FILTERS_DB: &str = "filters.db";
pub const HIGHLIGHT_DB: &str = "highlight.db";
pub const PANEL_MODES_DB: &str = "panelmodes.db";
pub const SHORTCUTS_DB: &str = "shortcuts.db";
pub const PLUGINS_DIR: &str = "PluginsData";

pub const FILTERS_SECTION: &str = "filters";
pub const HIGHLIGHT_SECTION: &str = "highlight";
pub const PANEL_MODES_SECTION: &str = "panelmodes";
pub const SHORTCUTS_SECTION: &str = "shortcuts";
pub const PLUGINS_SECTION: &str = "pluginsconfig";

const RENAMED: &str = "  - database file is renamed to *.bad and new one is created";
const IN_MEMORY: &str = "  - database is opened in memory";

/// What the process was started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Default,
    /// Whole-profile import; new databases are not seeded from the template.
    Import,
    Export,
}

/// The set of stores of one profile.
pub struct ConfigProvider {
    options: ProviderOptions,
    mode: Mode,
    template: OnceLock<Option<Document>>,
    problems: Mutex<Vec<String>>,

    general: FlatStore,
    local: FlatStore,
    colors: ColorStore,
    associations: AssociationStore,
    plugin_cache: PluginCacheStore,
    hotkeys: HotkeyStore,
    history: HistoryStore,
    history_memory: HistoryStore,
}

impl std::fmt::Debug for ConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigProvider")
            .field("options", &self.options)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl ConfigProvider {
    /// Open (or create) every database of the profile. Fails only when a
    /// store cannot be opened even in memory.
    pub fn open(options: ProviderOptions, mode: Mode) -> Result<Self> {
        tracing::info!(
            "Opening profile {} (local {})",
            options.profile_path.display(),
            options.local_profile_path.display()
        );

        let template = OnceLock::new();
        let problems = Mutex::new(Vec::new());
        let shell = Shell {
            options: &options,
            mode,
            template: &template,
            problems: &problems,
        };

        // 1. Top-level stores, each seeded from its section of the template
        let general = shell.create(GENERAL_DB, false, FlatStore::open, |root| {
            root.first_child(flat::ROAMING_SECTION)
        })?;
        let local = shell.create(LOCAL_DB, true, FlatStore::open, |root| {
            root.first_child(flat::LOCAL_SECTION)
        })?;
        let colors = shell.create(COLORS_DB, false, ColorStore::open, |root| {
            root.first_child(colors::EXPORT_SECTION)
        })?;
        let associations = shell.create(ASSOCIATIONS_DB, false, AssociationStore::open, |root| {
            root.first_child(associations::EXPORT_SECTION)
        })?;
        let hotkeys = shell.create(HOTKEYS_DB, false, HotkeyStore::open, |root| {
            root.first_child(hotkeys::EXPORT_SECTION)
        })?;

        // 2. Derived state, never seeded
        let plugin_cache = shell.create_unseeded(PLUGIN_CACHE_DB, true, PluginCacheStore::open)?;
        let history = shell.create_unseeded(HISTORY_DB, true, HistoryStore::open)?;
        let history_memory = HistoryStore::in_memory()?;

        Ok(Self {
            options,
            mode,
            template,
            problems,
            general,
            local,
            colors,
            associations,
            plugin_cache,
            hotkeys,
            history,
            history_memory,
        })
    }

    /// Wipe the plugin cache of a profile without opening anything else.
    pub fn clear_plugin_cache(options: &ProviderOptions) -> Result<()> {
        let path = options.database_path(PLUGIN_CACHE_DB, true);
        tracing::info!("Clearing plugin cache {}", path.display());
        PluginCacheStore::open(&Location::file(path))?.discard_cache()
    }

    fn shell(&self) -> Shell<'_> {
        Shell {
            options: &self.options,
            mode: self.mode,
            template: &self.template,
            problems: &self.problems,
        }
    }

    // ────────────────────────────────────────────────────────────────
    // Stores
    // ────────────────────────────────────────────────────────────────

    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn general(&self) -> &FlatStore {
        &self.general
    }

    pub fn local(&self) -> &FlatStore {
        &self.local
    }

    pub fn colors(&self) -> &ColorStore {
        &self.colors
    }

    pub fn associations(&self) -> &AssociationStore {
        &self.associations
    }

    pub fn plugin_cache(&self) -> &PluginCacheStore {
        &self.plugin_cache
    }

    pub fn hotkeys(&self) -> &HotkeyStore {
        &self.hotkeys
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Histories that must not outlive the session.
    pub fn history_memory(&self) -> &HistoryStore {
        &self.history_memory
    }

    /// Filters, with legacy fields brought up to date.
    pub fn create_filters_config(&self) -> Result<HierarchicalStore> {
        let store = self.shell().create(FILTERS_DB, false, HierarchicalStore::open, |root| {
            root.first_child(FILTERS_SECTION)
        })?;
        if let Err(err) = migrate::migrate_tree(&store) {
            tracing::warn!("Filter migration failed: {}", err);
        }
        Ok(store)
    }

    pub fn create_highlight_config(&self) -> Result<HierarchicalStore<HighlightBlobs>> {
        self.shell().create(
            HIGHLIGHT_DB,
            false,
            |location| HierarchicalStore::open_with(location, HighlightBlobs),
            |root| root.first_child(HIGHLIGHT_SECTION),
        )
    }

    pub fn create_panel_modes_config(&self) -> Result<HierarchicalStore> {
        self.shell().create(PANEL_MODES_DB, false, HierarchicalStore::open, |root| {
            root.first_child(PANEL_MODES_SECTION)
        })
    }

    pub fn create_shortcuts_config(&self) -> Result<HierarchicalStore> {
        self.shell().create(SHORTCUTS_DB, true, HierarchicalStore::open, |root| {
            root.first_child(SHORTCUTS_SECTION)
        })
    }

    /// Settings private to one plugin, in `PluginsData/<GUID>.db`.
    pub fn create_plugin_config(&self, plugin: &Uuid, local: bool) -> Result<HierarchicalStore> {
        let guid = guid_to_string(plugin);
        let name = format!("{}/{}.db", PLUGINS_DIR, guid);
        self.shell().create(&name, local, HierarchicalStore::open, |root| {
            root.first_child(PLUGINS_SECTION)?
                .children_named("plugin")
                .find(|p| p.attr("guid") == Some(guid.as_str()))
        })
    }

    /// Plugins with a roaming settings database.
    fn plugin_guids(&self) -> anyhow::Result<Vec<Uuid>> {
        let dir = self.options.profile_path.join(PLUGINS_DIR);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut guids = Vec::new();
        for entry in std::fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("db") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(guid) = parse_guid(&stem.to_uppercase()) {
                guids.push(guid);
            }
        }
        guids.sort();
        Ok(guids)
    }

    // ────────────────────────────────────────────────────────────────
    // Whole-profile export / import
    // ────────────────────────────────────────────────────────────────

    pub fn export(&self, path: &Path) -> anyhow::Result<()> {
        let mut document = Document::new();
        let (major, minor, patch) = version();
        document.set_version(major, minor, patch);
        let root = document.root_mut();

        self.general
            .export(root.add_child(flat::ROAMING_SECTION))
            .context("exporting general settings")?;
        self.local
            .export(root.add_child(flat::LOCAL_SECTION))
            .context("exporting local settings")?;
        self.colors
            .export(root.add_child(colors::EXPORT_SECTION))
            .context("exporting colors")?;
        self.associations
            .export(root.add_child(associations::EXPORT_SECTION))
            .context("exporting associations")?;
        self.hotkeys
            .export(root.add_child(hotkeys::EXPORT_SECTION))
            .context("exporting plugin hotkeys")?;

        self.create_filters_config()?
            .export(root.add_child(FILTERS_SECTION))
            .context("exporting filters")?;
        self.create_highlight_config()?
            .export(root.add_child(HIGHLIGHT_SECTION))
            .context("exporting highlight")?;
        self.create_panel_modes_config()?
            .export(root.add_child(PANEL_MODES_SECTION))
            .context("exporting panel modes")?;
        self.create_shortcuts_config()?
            .export(root.add_child(SHORTCUTS_SECTION))
            .context("exporting shortcuts")?;

        let plugins = root.add_child(PLUGINS_SECTION);
        for guid in self.plugin_guids()? {
            let e = plugins.add_child("plugin");
            e.set_attr("guid", guid_to_string(&guid));
            self.create_plugin_config(&guid, false)?
                .export(e)
                .with_context(|| format!("exporting plugin {}", guid_to_string(&guid)))?;
        }

        document
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!("Exported profile to {}", path.display());
        Ok(())
    }

    pub fn import(&self, path: &Path) -> anyhow::Result<()> {
        let document = Document::load(path).with_context(|| format!("reading {}", path.display()))?;
        let root = document.root();

        if let Some(section) = root.first_child(flat::ROAMING_SECTION) {
            self.general.import(section).context("importing general settings")?;
        }
        if let Some(section) = root.first_child(flat::LOCAL_SECTION) {
            self.local.import(section).context("importing local settings")?;
        }
        if let Some(section) = root.first_child(colors::EXPORT_SECTION) {
            self.colors.import(section).context("importing colors")?;
        }
        if let Some(section) = root.first_child(associations::EXPORT_SECTION) {
            self.associations.import(section).context("importing associations")?;
        }
        if let Some(section) = root.first_child(hotkeys::EXPORT_SECTION) {
            self.hotkeys.import(section).context("importing plugin hotkeys")?;
        }

        if let Some(section) = root.first_child(FILTERS_SECTION) {
            let filters = self.create_filters_config()?;
            filters.import(section).context("importing filters")?;
            migrate::migrate_tree(&filters).context("migrating imported filters")?;
        }
        if let Some(section) = root.first_child(HIGHLIGHT_SECTION) {
            self.create_highlight_config()?
                .import(section)
                .context("importing highlight")?;
        }
        if let Some(section) = root.first_child(PANEL_MODES_SECTION) {
            self.create_panel_modes_config()?
                .import(section)
                .context("importing panel modes")?;
        }
        if let Some(section) = root.first_child(SHORTCUTS_SECTION) {
            self.create_shortcuts_config()?
                .import(section)
                .context("importing shortcuts")?;
        }

        if let Some(plugins) = root.first_child(PLUGINS_SECTION) {
            for plugin in plugins.children_named("plugin") {
                let Some(guid) = plugin.attr("guid").and_then(|g| parse_guid(&g.to_uppercase())) else {
                    tracing::debug!("Skipping plugin section without a valid guid");
                    continue;
                };
                self.create_plugin_config(&guid, false)?
                    .import(plugin)
                    .with_context(|| format!("importing plugin {}", guid_to_string(&guid)))?;
            }
        }

        tracing::info!("Imported profile from {}", path.display());
        Ok(())
    }

    /// Everything that went wrong while opening, handed out once.
    pub fn problems(&self) -> Vec<String> {
        std::mem::take(&mut *self.problems.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

fn version() -> (u32, u32, u32) {
    (
        env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
        env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
        env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
    )
}

fn bad_path(path: &Path) -> PathBuf {
    let mut bad = path.as_os_str().to_owned();
    bad.push(".bad");
    PathBuf::from(bad)
}

// ════════════════════════════════════════════════════════════════════
// Opening with lock, fallback and template
// ════════════════════════════════════════════════════════════════════

/// Provider state needed to open a store, borrowed before the provider
/// itself exists.
#[derive(Clone, Copy)]
struct Shell<'a> {
    options: &'a ProviderOptions,
    mode: Mode,
    template: &'a OnceLock<Option<Document>>,
    problems: &'a Mutex<Vec<String>>,
}

impl Shell<'_> {
    fn report(&self, line: String) {
        tracing::warn!("{}", line);
        self.problems
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }

    /// Open under the advisory lock, then seed from the template once.
    fn create<S: Exportable + Transactional>(
        &self,
        name: &str,
        local: bool,
        open: impl Fn(&Location) -> Result<S>,
        section: impl FnOnce(&Element) -> Option<&Element>,
    ) -> Result<S> {
        let path = self.options.database_path(name, local);
        let _lock = self.lock(&path);
        let store = self.create_with_fallback(&path, &open)?;
        self.apply_template(&store, section);
        Ok(store)
    }

    fn create_unseeded<S>(&self, name: &str, local: bool, open: impl Fn(&Location) -> Result<S>) -> Result<S> {
        let path = self.options.database_path(name, local);
        let _lock = self.lock(&path);
        self.create_with_fallback(&path, &open)
    }

    fn lock(&self, path: &Path) -> Option<ProfileLock> {
        match ProfileLock::acquire(path, self.options.lock_retries) {
            Ok(lock) => Some(lock),
            Err(err) => {
                self.report(err.to_string());
                None
            }
        }
    }

    fn create_with_fallback<S>(&self, path: &Path, open: &impl Fn(&Location) -> Result<S>) -> Result<S> {
        let location = Location::file(path);
        let first = match open(&location) {
            Ok(store) => return Ok(store),
            Err(err) => err,
        };

        self.report(format!("{}:", path.display()));
        self.report(format!("  {}", first));

        if self.options.read_only || !self.rename_aside(path) {
            self.report(IN_MEMORY.to_string());
            return open(&Location::Memory);
        }

        match open(&location) {
            Ok(store) => {
                self.report(RENAMED.to_string());
                Ok(store)
            }
            Err(second) => {
                self.report(format!("  {}", second));
                self.report(IN_MEMORY.to_string());
                open(&Location::Memory)
            }
        }
    }

    fn rename_aside(&self, path: &Path) -> bool {
        let bad = bad_path(path);
        match std::fs::rename(path, &bad) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("Could not rename {} to {}: {}", path.display(), bad.display(), err);
                false
            }
        }
    }

    fn template(&self) -> Option<&'_ Document> {
        self.template
            .get_or_init(|| {
                let path = self.options.template_path.as_ref()?;
                if !path.exists() {
                    return None;
                }
                match Document::load(path) {
                    Ok(document) => {
                        tracing::info!("Loaded template {}", path.display());
                        Some(document)
                    }
                    Err(err) => {
                        self.report(format!("{}: {}", path.display(), err));
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Import the template section into a store the first time it is seen.
    fn apply_template<S: Exportable + Transactional>(
        &self,
        store: &S,
        section: impl FnOnce(&Element) -> Option<&Element>,
    ) {
        if self.mode == Mode::Import {
            return;
        }
        let db = store.database();
        match db.template_applied() {
            Ok(false) => {}
            Ok(true) => return,
            Err(err) => {
                tracing::warn!("Could not read template state of {}: {}", db.location(), err);
                return;
            }
        }

        if let Some(section) = self.template().and_then(|t| section(t.root())) {
            match store.import(section) {
                Ok(()) => tracing::info!("Applied template to {}", db.location()),
                Err(err) => self.report(format!("{}: template import failed: {}", db.location(), err)),
            }
        }
        if let Err(err) = db.mark_template_applied() {
            tracing::warn!("Could not record template state of {}: {}", db.location(), err);
        }
    }
}
