mod session;

use std::env;
use std::io;
use std::process;

use session::{BankProfile, Session};

fn main() -> io::Result<()> {
    let profile = parse_profile(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!(
            "Usage: blink-emulator [--profile <blink|burst|demo>] | blink-emulator <blink|burst|demo>"
        );
        process::exit(2);
    });

    Session::new(profile).repl(io::stdin().lock(), io::stdout().lock())
}

fn parse_profile<I>(mut args: I) -> Result<BankProfile, String>
where
    I: Iterator<Item = String>,
{
    match args.next() {
        None => Ok(BankProfile::Demo),
        Some(arg) => {
            if let Some(value) = arg.strip_prefix("--profile=") {
                BankProfile::from_tag(value)
            } else if arg == "--profile" {
                args.next().map_or_else(
                    || Err("Expected value after --profile".to_string()),
                    |value| BankProfile::from_tag(&value),
                )
            } else {
                BankProfile::from_tag(&arg)
            }
        }
    }
}
