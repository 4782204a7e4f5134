use behavior_host::init_process_sink;
use behavior_host::prelude::*;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Default)]
struct Counter {
    renders: Cell<u32>,
}

impl Owner for Counter {
    fn mark_needs_render(&self) {
        self.renders.set(self.renders.get() + 1);
    }

    fn configuration(&self) {}
}

// One test per binary: the process sink can be set only once.
#[test]
fn test_hosts_without_sink_report_to_process_sink() {
    let sink = Arc::new(MemorySink::new());
    init_process_sink(sink.clone()).unwrap();
    assert!(matches!(
        init_process_sink(Arc::new(MemorySink::new())),
        Err(LifecycleError::SinkAlreadyInitialized)
    ));

    let counter = Rc::new(Counter::default());
    let mut first: UnitHost = UnitHost::builder().label("first").build(&counter);
    let mut second: UnitHost = UnitHost::new(&counter);
    first.install(CallbackUnit::new().with_deactivate(|| anyhow::bail!("timer still running")));
    second.install(
        CallbackUnit::new()
            .with_kind("poller")
            .with_dispose(|| anyhow::bail!("socket closed")),
    );

    first.forward_deactivate();
    second.forward_dispose();

    let hosts: Vec<String> = sink.take().into_iter().map(|report| report.host).collect();
    assert_eq!(hosts, vec!["first".to_string(), "host".to_string()]);
}
