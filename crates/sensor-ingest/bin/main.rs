use sbuf::Sbuf;
use sensor_ingest::{datamgr, listener::Listener, storagemgr, IngestConfig, Record};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn print_usage() {
    eprintln!("usage: sensor-ingest <port number>");
}

/// Parses the single positional port argument, requiring the whole string
/// to be consumed as a base-10 number.
fn parse_port(args: &[String]) -> Option<u16> {
    let [arg] = args else {
        return None;
    };
    if arg.is_empty() {
        return None;
    }
    arg.parse::<u16>().ok()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(port) = parse_port(&args) else {
        print_usage();
        return ExitCode::FAILURE;
    };
    let config = IngestConfig::new(port);

    let buf = Arc::new(Sbuf::<Record>::new());
    let shutdown = Arc::new(AtomicBool::new(false));

    {
        let shutdown = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Release);
        }) {
            tracing::warn!(error = %e, "failed to install signal handler, Ctrl-C will not drain gracefully");
        }
    }

    let data_handle = {
        let buf = Arc::clone(&buf);
        thread::spawn(move || datamgr::run(buf))
    };
    let storage_handle = {
        let buf = Arc::clone(&buf);
        let log_path = config.storage_log_path.clone();
        thread::spawn(move || storagemgr::run(buf, log_path))
    };

    let listener = match Listener::bind(config.port, Arc::clone(&shutdown)) {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, port = config.port, "failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    // Last thing before close, mirroring the producer front's contract:
    // every frame accepted here is inserted before the loop returns.
    listener.run(Arc::clone(&buf));
    buf.close();

    data_handle.join().ok();
    storage_handle.join().ok();

    ExitCode::SUCCESS
}
