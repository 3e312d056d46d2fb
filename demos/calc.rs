use argscope::{ColorMode, ExitCode, Param, Parser};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut force = false;
    Parser::new()
        .color(ColorMode::Normal)
        .add(Param::flag("force", &mut force).short('f'))
        .add(
            Param::action("version", |ctx| {
                ctx.defer(|| {
                    println!("1.0.0");
                    Ok(())
                });
                Ok(())
            })
            .help("print the version and exit"),
        )
        .add(
            Param::subcommand("add", |ctx| {
                let (mut lhs, mut rhs) = (0u32, 0u32);
                let mut verbose = false;
                ctx.parse([
                    Param::flag("verbose", &mut verbose).short('v'),
                    Param::positional("lhs", &mut lhs),
                    Param::positional("rhs", &mut rhs),
                ])?;
                ctx.defer(move || {
                    let sum = lhs.checked_add(rhs).ok_or("sum overflowed")?;
                    match verbose {
                        true => println!("{} + {} = {}", lhs, rhs, sum),
                        false => println!("{}", sum),
                    }
                    Ok(())
                });
                Ok(())
            })
            .help("Addition"),
        )
        .add(
            Param::subcommand("mult", |ctx| {
                let (mut lhs, mut rhs) = (0f32, 0f32);
                ctx.parse([
                    Param::positional("lhs", &mut lhs),
                    Param::positional("rhs", &mut rhs),
                ])?;
                ctx.defer(move || {
                    println!("{} x {} = {}", lhs, rhs, lhs * rhs);
                    Ok(())
                });
                Ok(())
            })
            .help("Multiplication"),
        )
        .parse_args(std::env::args().skip(1))
        .go()
}
