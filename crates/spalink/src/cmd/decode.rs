use std::io::BufRead;
use std::time::{Duration, Instant};

use spalink_frame::{Reassembler, ReassemblerConfig};
use tracing::info;

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_report, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let lines = collect_lines(&args)?;
    let chunks = lines
        .iter()
        .map(|line| parse_hex(line))
        .collect::<CliResult<Vec<_>>>()?;

    let mut reassembler = Reassembler::with_config(ReassemblerConfig {
        stale_after: Duration::from_millis(args.stale_ms),
    });
    let gap = Duration::from_millis(args.gap_ms);
    let start = Instant::now();

    for (index, chunk) in chunks.iter().enumerate() {
        if chunk.is_empty() {
            continue;
        }
        let arrival = arrival_time(start, gap, index)?;
        let report = reassembler.process_at(chunk, arrival);
        print_report(index, &report, format);
    }

    let stats = reassembler.stats();
    info!(
        chunks = stats.chunks,
        valid = stats.valid,
        checksum_mismatches = stats.checksum_mismatches,
        malformed = stats.malformed,
        partials_discarded = stats.partials_discarded,
        pending = reassembler.pending_len(),
        "decode finished"
    );

    Ok(SUCCESS)
}

/// Simulated arrival of chunk `index` when chunks are `gap` apart.
fn arrival_time(start: Instant, gap: Duration, index: usize) -> CliResult<Instant> {
    u32::try_from(index)
        .ok()
        .and_then(|index| gap.checked_mul(index))
        .and_then(|offset| start.checked_add(offset))
        .ok_or_else(|| {
            CliError::new(
                USAGE,
                format!("--gap-ms {} is too large for chunk {index}", gap.as_millis()),
            )
        })
}

fn collect_lines(args: &DecodeArgs) -> CliResult<Vec<String>> {
    if !args.chunks.is_empty() {
        return Ok(args.chunks.clone());
    }

    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("read {}", path.display()), err))?,
        None => {
            let mut text = String::new();
            for line in std::io::stdin().lock().lines() {
                let line = line.map_err(|err| io_error("read stdin", err))?;
                text.push_str(&line);
                text.push('\n');
            }
            text
        }
    };

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrival_time_spaces_chunks_by_gap() {
        let start = Instant::now();
        let gap = Duration::from_millis(250);
        assert_eq!(arrival_time(start, gap, 0).unwrap(), start);
        assert_eq!(
            arrival_time(start, gap, 4).unwrap(),
            start + Duration::from_secs(1)
        );
    }

    #[test]
    fn arrival_time_overflow_is_a_usage_error() {
        let start = Instant::now();
        let gap = Duration::from_millis(u64::MAX);
        assert_eq!(arrival_time(start, gap, 0).unwrap(), start);
        assert_eq!(arrival_time(start, gap, 600).unwrap_err().code, USAGE);
    }
}
