//! A scoped, declarative command-line argument matcher.
//!
//! Parameters are declared up front against caller-owned variables, then a
//! [Parser] walks the tokens left to right, binding values and handing the
//! rest of the tokens to subcommands, which can parse them in a nested scope.
//! Work queued by subcommands runs only once the whole parse has succeeded.
//!
//! ```no_run
//! use argscope::{Param, Parser};
//!
//! fn main() -> std::process::ExitCode {
//!     Parser::new()
//!         .add(Param::subcommand("add", |ctx| {
//!             let (mut lhs, mut rhs) = (0i64, 0i64);
//!             ctx.parse([
//!                 Param::positional("lhs", &mut lhs),
//!                 Param::positional("rhs", &mut rhs),
//!             ])?;
//!             ctx.defer(move || {
//!                 println!("{}", lhs + rhs);
//!                 Ok(())
//!             });
//!             Ok(())
//!         }))
//!         .parse_args(std::env::args().skip(1))
//!         .go()
//! }
//! ```

mod arg;
mod error;
mod record;
mod registry;
mod value;

pub mod cli;
pub mod help;
pub mod proc;

pub use arg::{Arity, Handler, Hook, Kind, Param};
pub use cli::{Cursor, ParseResult, Parser, Settings};
pub use error::{ColorMode, Error, ErrorContext, ErrorKind};
pub use help::Usage;
pub use proc::{Action, Context, Outcome};
pub use record::{Field, Fields, Record, Role};
pub use registry::Registry;
pub use std::process::ExitCode;
pub use value::{Coercions, Fault, Hex, Shape, Slot, Target, Value};

/// Parses `args` against `params` in a fresh top-level scope.
pub fn parse<'a, I, S, P>(args: I, params: P) -> ParseResult
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    P: IntoIterator<Item = Param<'a>>,
{
    Parser::new().add_params(params).parse_args(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Helper test fn to write a vec of &str as owned tokens.
    fn args(args: Vec<&str>) -> Vec<String> {
        args.into_iter().map(|f| f.to_string()).collect()
    }

    mod flags {
        use super::*;

        #[test]
        fn set_by_switch() {
            let mut flag = false;
            let result = parse(args(vec!["--flag"]), [Param::flag("flag", &mut flag)]);
            assert_eq!(result.is_ok(), true);
            assert_eq!(flag, true);
        }

        #[test]
        fn untouched_without_switch() {
            let mut flag = false;
            let result = parse(args(vec![]), [Param::flag("flag", &mut flag)]);
            assert_eq!(result.is_ok(), true);
            assert_eq!(flag, false);
        }

        #[test]
        fn last_spelling_wins() {
            let mut flag = false;
            parse(
                args(vec!["--flag", "--no-flag"]),
                [Param::flag("flag", &mut flag)],
            )
            .run()
            .unwrap();
            assert_eq!(flag, false);

            let mut flag = false;
            parse(
                args(vec!["--no-flag", "--flag"]),
                [Param::flag("flag", &mut flag)],
            )
            .run()
            .unwrap();
            assert_eq!(flag, true);
        }

        #[test]
        fn single_hyphen_negation_is_rejected() {
            let mut flag = false;
            let mut actual = String::new();
            let result = parse(
                args(vec!["-no-flag", "actual"]),
                [
                    Param::flag("flag", &mut flag),
                    Param::positional("actual", &mut actual),
                ],
            );
            assert_eq!(
                result.error().map(|e| e.kind()),
                Some(ErrorKind::UnmatchedSwitch)
            );

            let mut flag = false;
            let mut actual = String::new();
            let result = Parser::new()
                .short_switches(false)
                .add(Param::flag("flag", &mut flag))
                .add(Param::positional("actual", &mut actual))
                .parse_args(args(vec!["-no-flag", "actual"]));
            assert_eq!(
                result.error().map(|e| e.kind()),
                Some(ErrorKind::UnexpectedArg)
            );
        }

        #[test]
        fn separator_protects_hyphens() {
            let mut flag = false;
            let mut actual = String::new();
            let result = parse(
                args(vec!["--", "-no-flag"]),
                [
                    Param::flag("flag", &mut flag),
                    Param::positional("actual", &mut actual),
                ],
            );
            assert_eq!(result.is_ok(), true);
            assert_eq!(flag, false);
            assert_eq!(actual, "-no-flag");
        }
    }

    mod positionals {
        use super::*;

        #[test]
        fn one_or_more_absorbs_the_rest() {
            let mut nums: Vec<i32> = Vec::new();
            let result = parse(
                args(vec!["1", "--", "-2", "3"]),
                [Param::positional("num", &mut nums)],
            );
            assert_eq!(result.is_ok(), true);
            assert_eq!(nums, vec![1, -2, 3]);

            let mut nums: Vec<i32> = Vec::new();
            let result = parse(args(vec![]), [Param::positional("num", &mut nums)]);
            assert_eq!(
                result.error().map(|e| e.kind()),
                Some(ErrorKind::Unsatisfied)
            );
        }

        #[test]
        fn zero_or_more_is_always_satisfied() {
            let mut nums: Vec<i32> = Vec::new();
            let result = parse(
                args(vec![]),
                [Param::positional("num", &mut nums).arity(Arity::ZeroOrMore)],
            );
            assert_eq!(result.is_ok(), true);
            assert_eq!(nums.is_empty(), true);
        }

        #[test]
        fn bad_value_reports_type() {
            let mut n = 0u8;
            let result = parse(args(vec!["300"]), [Param::positional("n", &mut n)]);
            let err = result.error().unwrap();
            assert_eq!(err.kind(), ErrorKind::BadType);
            match err.context() {
                ErrorContext::FailedCast { value, ty, .. } => {
                    assert_eq!(value, "300");
                    assert_eq!(*ty, "u8");
                }
                other => panic!("unexpected context {:?}", other),
            }
        }
    }

    mod help_param {
        use super::*;

        #[test]
        fn lists_every_valid_param() {
            let mut flag = false;
            let result = parse(args(vec!["--help"]), [Param::flag("flag", &mut flag)]);
            assert_eq!(result.is_help(), true);
            let err = result.error().unwrap();
            assert_eq!(
                err.to_string(),
                "valid arguments at this point:\n  --help,-h\n  --flag\n"
            );
            assert_eq!(err.code(), 0);
        }

        #[test]
        fn inside_a_subcommand_lists_its_scope() {
            let mut verbose = false;
            let result = parse(
                args(vec!["run", "-h"]),
                [Param::subcommand("run", |ctx| {
                    ctx.parse([Param::flag("verbose", &mut verbose).short('v')])?;
                    Ok(())
                })],
            );
            assert_eq!(result.is_help(), true);
            assert_eq!(
                result.error().unwrap().to_string(),
                "valid arguments at this point:\n  --help,-h\n  --verbose,-v\n"
            );
            assert_eq!(result.error().unwrap().scope().is_empty(), true);
        }
    }

    mod subcommands {
        use super::*;

        fn calc<'a>(log: Rc<RefCell<Vec<String>>>) -> Vec<Param<'a>> {
            let add_log = log.clone();
            vec![
                Param::subcommand("add", move |ctx| {
                    let (mut lhs, mut rhs) = (0i64, 0i64);
                    ctx.parse([
                        Param::positional("lhs", &mut lhs),
                        Param::positional("rhs", &mut rhs),
                    ])?;
                    let log = add_log.clone();
                    ctx.defer(move || {
                        log.borrow_mut().push(format!("{}", lhs + rhs));
                        Ok(())
                    });
                    Ok(())
                }),
                Param::subcommand("twice", move |ctx| {
                    let first = log.clone();
                    ctx.defer(move || {
                        first.borrow_mut().push("twice".to_string());
                        Ok(())
                    });
                    let inner = log.clone();
                    ctx.parse(calc(inner))?;
                    Ok(())
                }),
            ]
        }

        #[test]
        fn deferred_actions_run_after_success() {
            let log = Rc::new(RefCell::new(Vec::new()));
            let result = parse(args(vec!["twice", "add", "2", "3"]), calc(log.clone()));
            assert_eq!(result.is_ok(), true);
            assert_eq!(result.ran_subcommand(), true);
            assert_eq!(log.borrow().is_empty(), true);
            result.run().unwrap();
            assert_eq!(*log.borrow(), vec!["twice", "5"]);
        }

        #[test]
        fn nested_error_aborts_everything() {
            let log = Rc::new(RefCell::new(Vec::new()));
            let result = parse(args(vec!["twice", "add", "2", "x"]), calc(log.clone()));
            let err = result.error().unwrap();
            assert_eq!(err.kind(), ErrorKind::BadType);
            assert_eq!(err.scope(), &["twice".to_string(), "add".to_string()]);
            assert_eq!(result.run().is_err(), true);
            assert_eq!(log.borrow().is_empty(), true);
        }

        #[test]
        fn no_subcommand_selected() {
            let log = Rc::new(RefCell::new(Vec::new()));
            let result = parse(args(vec![]), calc(log));
            assert_eq!(result.is_ok(), true);
            assert_eq!(result.ran_subcommand(), false);
        }

        #[test]
        fn unknown_subcommand() {
            let log = Rc::new(RefCell::new(Vec::new()));
            let result = parse(args(vec!["sub"]), calc(log));
            let err = result.error().unwrap();
            assert_eq!(err.kind(), ErrorKind::UnexpectedArg);
            assert_eq!(
                help::render(err.usage().unwrap()),
                "valid arguments at this point:\n  --help,-h\n  add\n  twice\n"
            );
        }
    }

    #[test]
    fn parsing_is_repeatable() {
        let run = || {
            let mut count = 0u32;
            let mut names: Vec<String> = Vec::new();
            let result = parse(
                args(vec!["--count", "2", "a", "b"]),
                [
                    Param::option("count", &mut count),
                    Param::positional("name", &mut names),
                ],
            );
            (result.error().cloned(), count, names)
        };
        assert_eq!(run(), run());
        assert_eq!(run(), (None, 2, vec!["a".to_string(), "b".to_string()]));
    }
}
