use spalink_frame::{DEFAULT_STALE_AFTER, SPA_CRC_8};
use spalink_transport::DEFAULT_PORT;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("spalink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: spalink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("SPALINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("features: async={}, cli=true", cfg!(feature = "async"));
    println!("default_port: {DEFAULT_PORT}");
    println!("stale_after_ms: {}", DEFAULT_STALE_AFTER.as_millis());
    println!(
        "checksum: crc-8 poly=0x{:02x} init=0x{:02x} xorout=0x{:02x}",
        SPA_CRC_8.poly, SPA_CRC_8.init, SPA_CRC_8.xorout
    );

    Ok(SUCCESS)
}
