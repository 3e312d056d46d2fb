use argscope::{ExitCode, Field, Fields, Parser, Record};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Sum {
    verbose: bool,
    base: i64,
    nums: Vec<i64>,
    note: String,
}

impl Fields for Sum {
    fn fields<'a>(&'a mut self, record: Record<'a>) -> Record<'a> {
        record
            .field(Field::switch("verbose", &mut self.verbose).short('v'))
            .field(
                Field::switch("base", &mut self.base)
                    .default_value("0")
                    .help("value to start counting from"),
            )
            .field(
                Field::positional("nums", &mut self.nums)
                    .arity("+")
                    .help("integers to add (0x, 0o, 0b prefixes accepted)"),
            )
            .field(Field::switch("note", &mut self.note).skip())
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut sum = Sum::default();
    let params = match Record::of(&mut sum).into_params() {
        Ok(params) => params,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(e.code());
        }
    };
    let result = Parser::new()
        .add_params(params)
        .parse_args(std::env::args().skip(1));
    if result.error().is_some() {
        return result.go();
    }
    let total: i64 = sum.nums.iter().fold(sum.base, |acc, n| acc.saturating_add(*n));
    match sum.verbose {
        true => println!("{:?} = {}", sum, total),
        false => println!("{}", total),
    }
    ExitCode::SUCCESS
}
