//! Inspection binary entry point (native).

#[cfg(feature = "native")]
fn main() {
    use clap::Parser;

    env_logger::init();
    let args = folio_app::Args::parse();
    log::info!("Starting folio on {}", args.manifest.display());

    let result = pollster::block_on(folio_app::run(&args)).and_then(|report| report.to_json());
    match result {
        Ok(json) => println!("{json}"),
        Err(err) => {
            log::error!("{err}");
            eprintln!("folio: {err}");
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
