use spalink_frame::Frame;

use crate::cmd::{parse_hex, EncodeArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_bytes, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = parse_hex(&args.payload)?;
    let wire = Frame::new(payload)
        .encode()
        .map_err(|err| frame_error("encode failed", err))?;

    print_bytes("frame", &wire, format);
    Ok(SUCCESS)
}
