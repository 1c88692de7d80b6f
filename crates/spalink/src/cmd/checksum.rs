use spalink_frame::{checksum, MAX_PAYLOAD};

use crate::cmd::{parse_hex, ChecksumArgs};
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_bytes, OutputFormat};

pub fn run(args: ChecksumArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = parse_hex(&args.payload)?;
    if payload.len() > MAX_PAYLOAD {
        return Err(CliError::new(
            DATA_INVALID,
            format!("payload too large ({} bytes, max {MAX_PAYLOAD})", payload.len()),
        ));
    }

    let len = (payload.len() + 2) as u8;
    print_bytes("checksum", &[checksum(len, &payload)], format);
    Ok(SUCCESS)
}
