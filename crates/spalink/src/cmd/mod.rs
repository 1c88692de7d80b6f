use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use spalink_transport::DEFAULT_PORT;

use crate::exit::{CliError, CliResult, DATA_INVALID};
use crate::output::OutputFormat;

pub mod checksum;
pub mod decode;
pub mod encode;
pub mod listen;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run hex-encoded chunks through the frame reassembler.
    Decode(DecodeArgs),
    /// Connect to a controller and print frames as they arrive.
    Listen(ListenArgs),
    /// Compute the frame checksum for a payload.
    Checksum(ChecksumArgs),
    /// Frame a payload for the wire.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Checksum(args) => checksum::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Chunks in arrival order, one hex string each (e.g. "7e 05 10 bf").
    #[arg(conflicts_with = "file")]
    pub chunks: Vec<String>,
    /// Read chunks from a file, one per line. Defaults to stdin without chunks.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Staleness window for partial frames, in milliseconds.
    #[arg(long, default_value = "1000")]
    pub stale_ms: u64,
    /// Simulated time between consecutive chunks, in milliseconds.
    #[arg(long, default_value = "0")]
    pub gap_ms: u64,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Controller host name or address.
    #[arg(long, env = "SPALINK_HOST")]
    pub host: String,
    /// Controller TCP port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Exit after receiving N valid frames (N >= 1).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,
    /// Connection timeout (e.g. 5s, 500ms, 1m).
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub timeout: Duration,
    /// Staleness window for partial frames, in milliseconds.
    #[arg(long, default_value = "1000")]
    pub stale_ms: u64,
}

#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// Payload bytes in hex, without length, checksum or delimiters.
    pub payload: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Payload bytes in hex.
    pub payload: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse hex bytes, ignoring whitespace and `:`/`,`/`-` separators.
pub(crate) fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits = input
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !matches!(c, ':' | ',' | '-'))
        .map(|c| {
            c.to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| CliError::new(DATA_INVALID, format!("invalid hex digit {c:?}")))
        })
        .collect::<CliResult<Vec<u8>>>()?;

    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("odd number of hex digits: {input}"),
        ));
    }

    Ok(digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

/// Parse a positive duration such as `750ms`, `5s`, `2m` or a bare number of seconds.
fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration: {input:?}"))?;
    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "" | "s" => Ok(Duration::from_secs(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration too large: {input}")),
        other => Err(format!("unknown duration unit {other:?} (use ms, s or m)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_separators() {
        assert_eq!(parse_hex("7e 05 10").unwrap(), vec![0x7E, 0x05, 0x10]);
        assert_eq!(parse_hex("7E:05:10").unwrap(), vec![0x7E, 0x05, 0x10]);
        assert_eq!(parse_hex("7e0510").unwrap(), vec![0x7E, 0x05, 0x10]);
        assert!(parse_hex("").unwrap().is_empty());
    }

    #[test]
    fn parse_hex_rejects_bad_input() {
        assert_eq!(parse_hex("7e0").unwrap_err().code, DATA_INVALID);
        assert_eq!(parse_hex("zz").unwrap_err().code, DATA_INVALID);
    }

    #[test]
    fn parse_hex_rejects_sign_prefix() {
        assert_eq!(parse_hex("+f").unwrap_err().code, DATA_INVALID);
        assert_eq!(parse_hex("7e +5").unwrap_err().code, DATA_INVALID);
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("150ms"), Ok(Duration::from_millis(150)));
        assert_eq!(parse_duration("2s"), Ok(Duration::from_secs(2)));
        assert_eq!(parse_duration(" 3 "), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("5h").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration("18446744073709551615m").is_err());
    }
}
