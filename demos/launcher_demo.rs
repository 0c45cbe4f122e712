//! Minimal example: a launcher protecting one app link and one note.
//!
//! Demonstrates group creation, protect/open with right and wrong PINs, and
//! an export unlock, persisted to a temp directory.
//! Run with: `cargo run --example launcher_demo`
//!
//! Set `PINGATE_CIPHER_MODE=fallback` to run the weaker tier.

use std::sync::Arc;

use pingate::{
    AccessGate, AccessOutcome, FilePersistence, GateConfig, GroupSelection, ItemRef, StoredValue,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    // 1. Setup: mode resolved once, one gate per process.
    let config = GateConfig::default().with_env_override()?;
    let data_dir = std::env::temp_dir().join("pingate-demo");
    let gate = AccessGate::new(&config, Arc::new(FilePersistence::open(&data_dir)?));
    println!("cipher mode: {}", config.cipher_mode.as_str());

    // 2. A PIN group.
    let bank = gate.credentials().add_group("Bank", "4242", "last 4 digits")?;

    // 3. Protect an app link and a note.
    let app = ItemRef::app("bank-app");
    let note = ItemRef::note("pin-reminders");
    let link = gate.protect(&app, &bank, "4242", "https://bank.example/login")?;
    let body = gate.protect(&note, &bank, "4242", "card PIN is NOT 4242")?;
    println!("stored link blob: {link}");

    // 4. Open with the right and the wrong PIN.
    for pin in ["4242", "0000"] {
        match gate.open_outcome(&app, pin, &link) {
            AccessOutcome::Granted(url) => println!("{pin}: open {url}"),
            AccessOutcome::Denied => println!("{pin}: incorrect PIN"),
        }
    }

    // 5. Export everything the Bank PIN unlocks.
    let export = gate.unlock_for_export(
        vec![StoredValue::new(app.clone(), link), StoredValue::new(note.clone(), body)],
        &[GroupSelection::new(&bank, "4242")],
    );
    println!("exported {} items: {:?}", export.items.len(), export.report);

    // 6. Clean up so the demo can be rerun.
    gate.forget(&app)?;
    gate.forget(&note)?;
    gate.credentials().delete_group(&bank)?;
    println!("state kept in {}", data_dir.display());

    Ok(())
}
