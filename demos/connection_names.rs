use kbus_meta::Core::{AllowAll, FixedFacts, LocalConnection, ProcessFacts};
use kbus_meta::{Category, CategorySet, Metadata};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A fabricated sender: no security label, owns two names.
    let facts = FixedFacts::new()
        .with_pid(100)
        .with_uid(1000)
        .with_names(["org.example.Alpha", "org.example.Beta"]);

    let mut meta = Metadata::new();
    meta.append(&facts, CategorySet::PID | CategorySet::UID | CategorySet::SECLABEL)?;
    println!("after first append:  {}", meta.attached());

    meta.append(&facts, CategorySet::PID | CategorySet::UID | CategorySet::NAMES)?;
    println!("after second append: {}", meta.attached());
    for name in meta.names().iter() {
        println!("  owns {}", name);
    }

    // The same through a live connection, with a policy hiding the command line.
    let conn = LocalConnection::new(7, ProcessFacts::current());
    conn.acquire_name("org.example.Gamma")?;
    let hide_cmdline = |c: Category| c != Category::Cmdline;

    let mut live = Metadata::new();
    conn.capture_with_policy(&mut live, &hide_cmdline, CategorySet::all())?;
    println!("live connection:     {}", live.attached());

    let mut unrestricted = Metadata::new();
    conn.capture_with_policy(&mut unrestricted, &AllowAll, CategorySet::all())?;
    println!("without policy:      {}", unrestricted.attached());
    Ok(())
}
