//! Toast Lifecycle Demo
//!
//! Builds a toast with a close button, shows it, and drives the virtual
//! clock through the enter transition, the autohide delay and the leave
//! transition, logging every toast event along the way.
//!
//! Run with: RUST_LOG=trace cargo run -p glint_cn --example toast_lifecycle

use std::time::Duration;

use glint_cn::components::toast::{EVENT_HIDDEN, EVENT_HIDE, EVENT_SHOW, EVENT_SHOWN};
use glint_cn::prelude::*;
use glint_core::{Result, Runtime};

const STYLESHEET: &str = r#"
    /* fade transition */
    .fade-enter-active, .fade-leave-active { transition-duration: 0.15s; }
    .toast.slow { transition-delay: 100ms; }
"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let runtime = Runtime::new();
    runtime.add_stylesheet(STYLESHEET)?;

    let element = runtime.create_element("div");
    runtime.set_attribute(element, "class", "toast");
    runtime.set_attribute(element, "data-delay", "2000");

    let close = runtime.create_element("button");
    runtime.set_attribute(close, "data-dismiss", "toast");
    runtime.append_child(element, close);

    for name in [EVENT_SHOW, EVENT_SHOWN, EVENT_HIDE, EVENT_HIDDEN] {
        let clock = runtime.downgrade();
        runtime.on(element, name, move |_| {
            let now = clock.upgrade().map(|runtime| runtime.now()).unwrap_or_default();
            tracing::info!(?now, event = name, "toast event");
        });
    }

    let toast = Toast::new(&runtime, element, None)?;
    tracing::info!(config = ?toast.config(), "toast ready");

    // Show, then let the autohide timer close it
    toast.show();
    tracing::info!(classes = %runtime.class_name(element), "after show()");
    runtime.run_animation_frame();
    tracing::info!(classes = %runtime.class_name(element), "after first frame");
    runtime.advance(Duration::from_millis(155));
    tracing::info!(classes = %runtime.class_name(element), state = ?toast.state(), "shown");
    runtime.advance(Duration::from_millis(2000));
    runtime.advance(Duration::from_millis(155));
    tracing::info!(classes = %runtime.class_name(element), state = ?toast.state(), "auto-hidden");

    // Show again and dismiss with the close button
    toast_interface(&runtime, &[element], PluginArg::Command("show"))?;
    runtime.advance(Duration::from_millis(155));
    runtime.click(close);
    runtime.advance(Duration::from_millis(155));
    tracing::info!(classes = %runtime.class_name(element), state = ?toast.state(), "dismissed");

    toast.dispose();
    tracing::info!(stats = ?runtime.stats(), "disposed");

    if let Err(err) = toast_interface(&runtime, &[element], PluginArg::Command("frobnicate")) {
        tracing::warn!(%err, "plugin bridge rejected command");
    }

    Ok(())
}
