use crate::arg::Param;
use crate::error::Error;
use std::fmt::Display;

mod tag {
    pub const FLAG: &str = "help";
    pub const SWITCH: char = 'h';
}

pub const HEADER: &str = "valid arguments at this point:";

/// How a single parameter is spelled in a usage listing.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Usage {
    pub switches: Vec<String>,
    pub arguments: Vec<String>,
    pub help: String,
}

impl Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "  {}", self.switches.join(","))?;
        for (i, arg) in self.arguments.iter().enumerate() {
            match i == 0 && self.switches.is_empty() {
                true => write!(f, "{}", arg)?,
                false => write!(f, " {}", arg)?,
            }
        }
        if self.help.is_empty() == false {
            write!(f, "\n\t{}", self.help)?;
        }
        Ok(())
    }
}

/// Formats a full listing of `usages` under the standard header.
pub fn render(usages: &[Usage]) -> String {
    let mut text = String::from(HEADER);
    text.push('\n');
    for usage in usages {
        text.push_str(&usage.to_string());
        text.push('\n');
    }
    text
}

/// Creates the built-in `--help, -h` parameter.
///
/// Raising it renders the usage of the scope it was raised in and ends the
/// parse with an [ErrorKind::Help][crate::ErrorKind::Help] error, which a
/// driver treats as a clean exit.
pub fn param<'a>() -> Param<'a> {
    Param::action(tag::FLAG, |ctx| Err(Error::help(ctx.usage()))).short(tag::SWITCH)
}
