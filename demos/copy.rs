use argscope::{Arity, Coercions, ExitCode, Fault, Hex, Param, Parser, Slot};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Overwrite,
    Skip,
    Rename,
}

#[derive(Debug, Default)]
struct Bandwidth(u64);

fn bandwidth(text: &str) -> Result<Bandwidth, Fault> {
    let (digits, scale) = match text.strip_suffix('k') {
        Some(digits) => (digits, 1_000),
        None => match text.strip_suffix('m') {
            Some(digits) => (digits, 1_000_000),
            None => (text, 1),
        },
    };
    let n = digits
        .parse::<u64>()
        .map_err(|e| Fault::Parse(e.to_string()))?;
    n.checked_mul(scale)
        .map(Bandwidth)
        .ok_or_else(|| Fault::Overflow {
            text: text.to_string(),
            ty: "u64",
        })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut mode = Mode::Overwrite;
    let mut timeout = Duration::from_secs(30);
    let mut limit = Bandwidth::default();
    let mut checksum: Option<Hex> = None;
    let mut excludes: Vec<String> = Vec::new();
    let mut sources: Vec<PathBuf> = Vec::new();
    let mut dest = PathBuf::new();

    let result = Parser::new()
        .coercions(Coercions::builtin().with(bandwidth))
        .add(
            Param::choice(
                "mode",
                &mut mode,
                [
                    ("overwrite", Mode::Overwrite),
                    ("skip", Mode::Skip),
                    ("rename", Mode::Rename),
                ],
            )
            .short('m')
            .arity(Arity::ZeroOrOne),
        )
        .add(
            Param::option("timeout", &mut timeout)
                .short('t')
                .help("give up after this long (e.g. 90s, 2m)"),
        )
        .add(
            Param::option("limit", Slot::custom(&mut limit))
                .value_name("rate")
                .help("bytes per second, with an optional k/m suffix"),
        )
        .add(Param::option("checksum", &mut checksum).value_name("hex"))
        .add(Param::option("exclude", &mut excludes).short('x'))
        .add(Param::positional("dest", &mut dest))
        .add(Param::positional("source", &mut sources))
        .parse_args(std::env::args().skip(1));
    if result.error().is_some() {
        return result.go();
    }
    for source in &sources {
        println!("{} -> {} ({:?})", source.display(), dest.display(), mode);
    }
    println!("timeout: {}", humantime::format_duration(timeout));
    println!("limit: {} B/s", limit.0);
    if let Some(sum) = &checksum {
        println!("expecting checksum of {} bytes", sum.as_bytes().len());
    }
    if excludes.is_empty() == false {
        println!("excluding: {}", excludes.join(", "));
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bandwidth_suffixes() {
        assert_eq!(bandwidth("512").map(|b| b.0), Ok(512));
        assert_eq!(bandwidth("4k").map(|b| b.0), Ok(4_000));
        assert_eq!(bandwidth("2m").map(|b| b.0), Ok(2_000_000));
        assert_eq!(bandwidth("fast").is_err(), true);
    }

    #[test]
    fn bandwidth_overflow_is_a_fault() {
        assert_eq!(
            bandwidth("99999999999999999k").map(|b| b.0),
            Err(Fault::Overflow {
                text: "99999999999999999k".to_string(),
                ty: "u64"
            })
        );
    }
}
