// In demos/capture_self.rs
use kbus_meta::Core::{DiagnosticEndpoint, LocalConnection};
use kbus_meta::{CategorySet, Fact, MetaBuilder};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let which = match args.get(1) {
        Some(list) => CategorySet::parse(list)?,
        None => CategorySet::all(),
    };
    let dir = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| env::temp_dir().display().to_string());

    let endpoint = DiagnosticEndpoint::create(&dir)?;
    let conn = LocalConnection::for_current_process(1).with_description("capture-self");
    conn.acquire_name("org.example.CaptureSelf")?;

    let running = Arc::new(AtomicBool::new(true));
    let running_for_handler = Arc::clone(&running);

    // Handle Ctrl+C to stop the capture loop
    ctrlc::set_handler(move || {
        running_for_handler.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    println!("Capturing [{}] every second, endpoint at {:?}", which, endpoint.path());

    while running.load(Ordering::SeqCst) {
        let mut meta = MetaBuilder::new().build()?;
        conn.capture(&mut meta, which)?;
        endpoint.record(meta.attached());
        endpoint.publish()?;

        println!(
            "--- {} items, {} of {} bytes used, names blob {} bytes",
            meta.items().len(),
            meta.size(),
            meta.allocated_size(),
            meta.names().len()
        );
        for fact in meta.facts() {
            match fact {
                Fact::Names { count, .. } => {
                    let names: Vec<&str> = meta.names().iter().collect();
                    println!("  names ({}): {:?}", count, names);
                }
                other => println!("  {:?}", other),
            }
        }

        meta.free();
        std::thread::sleep(Duration::from_secs(1));
    }

    println!("Stopped after {} captures", endpoint.captures());
    Ok(())
}
