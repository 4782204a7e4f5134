use anyhow::Result;
use behavior_host::prelude::*;
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

// ------------------------------------
// Test owner: a settings screen
// ------------------------------------

#[derive(Default)]
struct SettingsScreen {
    renders: Cell<u32>,
    theme: RefCell<String>,
}

impl SettingsScreen {
    fn new(theme: &str) -> Rc<Self> {
        let screen = Rc::new(Self::default());
        *screen.theme.borrow_mut() = theme.to_string();
        screen
    }
}

impl Owner<String> for SettingsScreen {
    fn mark_needs_render(&self) {
        self.renders.set(self.renders.get() + 1);
    }

    fn configuration(&self) -> String {
        self.theme.borrow().clone()
    }
}

// ------------------------------------
// Custom unit: remembers every theme it has seen
// ------------------------------------

struct ThemeHistory {
    base: UnitBase<String>,
    seen: Vec<String>,
    disposed: bool,
}

impl ThemeHistory {
    fn new() -> Self {
        Self {
            base: UnitBase::new(),
            seen: Vec::new(),
            disposed: false,
        }
    }
}

impl BehaviorUnit<String> for ThemeHistory {
    fn kind(&self) -> UnitKind {
        UnitKind::custom("theme_history")
    }

    fn base(&self) -> &UnitBase<String> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut UnitBase<String> {
        &mut self.base
    }

    fn on_create(&mut self) -> Result<()> {
        let current = self.base.expect_host().configuration().unwrap_or_default();
        self.seen.push(current);
        Ok(())
    }

    fn on_configuration_update(&mut self, old: &String) -> Result<()> {
        let current = self.base.expect_host().configuration().unwrap_or_default();
        if &current == old {
            anyhow::bail!("configuration update without a change ({old})");
        }
        self.seen.push(current);
        Ok(())
    }

    fn on_dispose(&mut self) -> Result<()> {
        self.disposed = true;
        Ok(())
    }
}

fn screen_host(screen: &Rc<SettingsScreen>) -> (UnitHost<String>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let host = UnitHost::builder()
        .label("settings")
        .sink(sink.clone())
        .build(screen);
    (host, sink)
}

#[test]
fn test_full_lifecycle_with_custom_unit() {
    let screen = SettingsScreen::new("light");
    let (mut host, sink) = screen_host(&screen);

    let history = host.install(ThemeHistory::new());
    let toggles = host.install(ObservableUnit::new(false));

    *screen.theme.borrow_mut() = "dark".to_string();
    host.forward_configuration_update(&"light".to_string());
    toggles.borrow().observable().set(true);
    host.forward_deactivate();
    host.forward_dispose();

    let history = history.borrow();
    assert_eq!(history.seen, vec!["light", "dark"]);
    assert!(history.disposed);
    assert_eq!(screen.renders.get(), 1);
    assert!(sink.is_empty());
}

#[test]
fn test_unit_failure_reaches_sink_and_others_continue() {
    let screen = SettingsScreen::new("light");
    let (mut host, sink) = screen_host(&screen);
    let history = host.install(ThemeHistory::new());
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    host.install(CallbackUnit::new().with_configuration_update(move |_old: &String| {
        counter.set(counter.get() + 1);
        Ok(())
    }));

    host.forward_configuration_update(&"light".to_string());

    assert_eq!(calls.get(), 1);
    assert_eq!(history.borrow().seen, vec!["light"]);
    let reports = sink.take();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].unit, UnitKind::custom("theme_history"));
    assert_eq!(reports[0].event, LifecycleEvent::ConfigurationUpdate);
    assert!(reports[0].error.to_string().contains("without a change"));
}

#[test]
fn test_units_compose_through_forwarding() {
    let screen = SettingsScreen::new("light");
    let (mut host, _sink) = screen_host(&screen);

    let wrapped = host.install(TracedUnit::new(
        "history",
        ForwardingUnit::new(ThemeHistory::new()),
    ));
    *screen.theme.borrow_mut() = "solarized".to_string();
    host.forward_configuration_update(&"light".to_string());

    let wrapped = wrapped.borrow();
    assert_eq!(wrapped.kind(), UnitKind::custom("theme_history"));
    assert_eq!(wrapped.child().child().seen, vec!["light", "solarized"]);
}

#[test]
fn test_host_config_from_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        "{}",
        json!({
            "label": "settings",
            "trace_dispatch": true,
            "metadata": { "route": "/settings" }
        })
    )?;

    let config = HostConfig::from_file(file.path())?;
    assert_eq!(config.label, "settings");
    assert!(config.trace_dispatch);

    let screen = SettingsScreen::new("light");
    let host: UnitHost<String> = UnitHost::builder().config(config).build(&screen);
    assert_eq!(host.handle().metadata("route"), Some(json!("/settings")));
    Ok(())
}

#[test]
fn test_host_config_from_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = HostConfig::from_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(LifecycleError::Io(_))));
}

#[test]
fn test_trace_dispatch_with_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let screen = SettingsScreen::new("light");
    let sink = Arc::new(MemorySink::new());
    let mut host: UnitHost<String> = UnitHost::builder()
        .label("traced")
        .trace_dispatch(true)
        .sink(sink.clone())
        .build(&screen);
    host.install(CallbackUnit::new().with_reassemble(|| anyhow::bail!("stale layout")));

    host.forward_reassemble();
    host.forward_dispose();

    assert_eq!(
        sink.summary(),
        vec![(UnitKind::CALLBACK, LifecycleEvent::Reassemble)]
    );
}
