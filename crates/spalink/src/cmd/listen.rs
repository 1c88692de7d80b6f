use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use spalink_frame::{FrameConfig, FrameError, FrameReader};
use spalink_transport::SpaStream;
use tracing::info;

use crate::cmd::ListenArgs;
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat};

// Lets the read loop notice Ctrl-C on a quiet link.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let stream = SpaStream::connect(&args.host, args.port, args.timeout)
        .map_err(|err| transport_error("connect failed", err))?;
    let peer = stream.peer_addr();

    let config = FrameConfig {
        stale_after: Duration::from_millis(args.stale_ms),
        read_timeout: Some(POLL_INTERVAL),
        ..FrameConfig::default()
    };
    let mut reader = FrameReader::with_config_tcp(stream, config)
        .map_err(|err| frame_error("stream setup failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut chunk = 0usize;
    let mut received = 0u64;

    while running.load(Ordering::SeqCst) {
        let report = match reader.read_chunk() {
            Ok(report) => report,
            Err(FrameError::Io(err))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                continue
            }
            Err(FrameError::ConnectionClosed) => {
                info!(%peer, "controller closed the connection");
                break;
            }
            Err(err) => return Err(frame_error("receive failed", err)),
        };

        print_report(chunk, &report, format);
        chunk = chunk.saturating_add(1);
        received = received.saturating_add(report.valid_payloads().count() as u64);

        if let Some(count) = args.count {
            if received >= count {
                return Ok(SUCCESS);
            }
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
