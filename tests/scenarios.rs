use argscope::{
    Arity, Coercions, Cursor, ErrorKind, ExitCode, Fault, Field, Fields, Param, Parser, Record,
    Slot,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn args(args: Vec<&str>) -> Vec<String> {
    args.into_iter().map(|f| f.to_string()).collect()
}

#[derive(Debug, Default, PartialEq)]
struct Fetch {
    quiet: bool,
    retries: u8,
    timeout: Duration,
    mirrors: Vec<String>,
    urls: Vec<String>,
}

impl Fields for Fetch {
    fn fields<'a>(&'a mut self, record: Record<'a>) -> Record<'a> {
        record
            .field(Field::switch("quiet", &mut self.quiet).short('q'))
            .field(Field::switch("retries", &mut self.retries).default_value("3"))
            .field(Field::switch("timeout", &mut self.timeout).default_value("10s"))
            .field(Field::switch("mirrors", &mut self.mirrors).arity("*").short('m'))
            .field(Field::positional("urls", &mut self.urls).arity("+"))
    }
}

#[test]
fn record_with_defaults_and_overrides() {
    let mut fetch = Fetch::default();
    let params = Record::of(&mut fetch).into_params().unwrap();
    let result = Parser::new().add_params(params).parse_args(args(vec![
        "-qm",
        "eu",
        "--mirrors=us",
        "--timeout",
        "1m",
        "a.tar",
        "b.tar",
    ]));
    assert_eq!(result.is_ok(), true);
    assert_eq!(
        fetch,
        Fetch {
            quiet: true,
            retries: 3,
            timeout: Duration::from_secs(60),
            mirrors: vec!["eu".to_string(), "us".to_string()],
            urls: vec!["a.tar".to_string(), "b.tar".to_string()],
        }
    );
}

#[test]
fn record_help_lists_fields() {
    let mut fetch = Fetch::default();
    let params = Record::of(&mut fetch).into_params().unwrap();
    let result = Parser::new().add_params(params).parse_args(args(vec!["-h"]));
    assert_eq!(result.is_help(), true);
    assert_eq!(
        result.error().unwrap().to_string(),
        "valid arguments at this point:
  --help,-h
  --quiet,-q
  --retries <retries>
  --timeout <timeout>
  --mirrors,-m <mirrors>...
  <Fetch.urls>...
"
    );
}

#[derive(Debug, PartialEq, Clone, Copy)]
struct Percent(u8);

fn percent(text: &str) -> Result<Percent, Fault> {
    let digits = text.strip_suffix('%').unwrap_or(text);
    match digits.parse::<u8>() {
        Ok(n) if n <= 100 => Ok(Percent(n)),
        _ => Err(Fault::Parse(format!("{} is not a percentage", text))),
    }
}

#[test]
fn custom_coercion_in_nested_scope() {
    let mut volume = Percent(0);
    let result = Parser::new()
        .coercions(Coercions::builtin().with(percent))
        .add(Param::subcommand("set", |ctx| {
            let volume = Slot::custom(&mut volume);
            ctx.parse([Param::option("volume", volume).required()])?;
            Ok(())
        }))
        .parse_args(args(vec!["set", "--volume", "75%"]));
    assert_eq!(result.is_ok(), true);
    assert_eq!(volume, Percent(75));

    let mut volume = Percent(0);
    let result = Parser::new()
        .coercions(Coercions::builtin().with(percent))
        .add(Param::subcommand("set", |ctx| {
            ctx.parse([Param::option("volume", Slot::custom(&mut volume))])?;
            Ok(())
        }))
        .parse_args(args(vec!["set", "--volume", "175%"]));
    assert_eq!(result.error().map(|e| e.kind()), Some(ErrorKind::BadType));
}

#[test]
fn handler_drives_its_own_parser() {
    let mut cursor = Cursor::new(args(vec!["remote", "add", "origin", "--", "-weird-url"]));
    let mut name = String::new();
    let mut url = String::new();
    let mut parser = Parser::new().add(Param::subcommand("remote", |ctx| {
        let mut inner = ctx.parser().add(Param::subcommand("add", |ctx| {
            let outcome = ctx.parse([
                Param::positional("name", &mut name),
                Param::positional("url", &mut url),
            ])?;
            assert_eq!(outcome.ran_subcommand, false);
            Ok(())
        }));
        let outcome = ctx.run(&mut inner)?;
        assert_eq!(outcome.ran_subcommand, true);
        Ok(())
    }));
    parser.parse(&mut cursor).unwrap();
    assert_eq!(parser.ran_subcommand(), true);
    drop(parser);
    assert_eq!(cursor.is_empty(), true);
    assert_eq!((name.as_str(), url.as_str()), ("origin", "-weird-url"));
}

#[test]
fn driver_exit_codes() {
    let ran = Rc::new(RefCell::new(false));
    let flag = ran.clone();
    let commands = move || {
        let flag = flag.clone();
        Param::subcommand("go", move |ctx| {
            let flag = flag.clone();
            ctx.defer(move || {
                *flag.borrow_mut() = true;
                Ok(())
            });
            Ok(())
        })
    };

    let code = Parser::new()
        .add(commands())
        .parse_args(args(vec!["--help"]))
        .go();
    assert_eq!(code, ExitCode::from(0));
    assert_eq!(*ran.borrow(), false);

    let code = Parser::new()
        .add(commands())
        .parse_args(args(vec![]))
        .go();
    assert_eq!(code, ExitCode::from(101));
    let code = Parser::new()
        .add(commands())
        .parse_args(args(vec!["stop"]))
        .go();
    assert_eq!(code, ExitCode::from(101));
    assert_eq!(*ran.borrow(), false);

    let code = Parser::new()
        .add(commands())
        .parse_args(args(vec!["go"]))
        .go();
    assert_eq!(code, ExitCode::from(0));
    assert_eq!(*ran.borrow(), true);

    let failing = Parser::new()
        .add(Param::subcommand("go", |ctx| {
            ctx.defer(|| Err("disk full".into()));
            Ok(())
        }))
        .parse_args(args(vec!["go"]));
    assert_eq!(failing.go(), ExitCode::from(101));
}

#[test]
fn scopes_without_subcommands_succeed_quietly() {
    let mut level = 0u8;
    let code = Parser::new()
        .add(Param::option("level", &mut level).arity(Arity::ZeroOrOne))
        .parse_args(args(vec!["--level", "2"]))
        .go();
    assert_eq!(code, ExitCode::from(0));
    assert_eq!(level, 2);
}
