use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("stompwire {}", env!("CARGO_PKG_VERSION"));
    if args.extended {
        println!("protocols: STOMP 1.0, 1.1, 1.2");
        println!("default port: {}", crate::cmd::DEFAULT_PORT);
        println!(
            "platform: {}/{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        );
    }
    Ok(SUCCESS)
}
