//! printf-style formatting for the reference runtime
//!
//! Supports `%d %i %u %x %p %s %%` with the `hh`, `h`, `l` and `ll` length
//! modifiers, which covers every directive the emitter generates.

use regex::{Captures, Regex};

use crate::error::{Error, Result};
use crate::runtime::Value;

lazy_static::lazy_static! {
    static ref DIRECTIVE: Regex =
        Regex::new(r"%(%|(hh|h|ll|l)?([diuxps]))").expect("directive pattern is valid");
}

/// Formats `args` according to `format`
pub fn format(format: &str, args: &[Value]) -> Result<String> {
    let mut out = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut last = 0;

    for caps in DIRECTIVE.captures_iter(format) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&format[last..whole.start()]);
        last = whole.end();

        if &caps[1] == "%" {
            out.push('%');
            continue;
        }
        let arg = args.next().ok_or_else(|| {
            Error::FormatError(format!("missing argument for `{}`", whole.as_str()))
        })?;
        out.push_str(&render(&caps, arg)?);
    }
    out.push_str(&format[last..]);

    if args.next().is_some() {
        return Err(Error::FormatError(format!(
            "too many arguments for {:?}",
            format
        )));
    }
    Ok(out)
}

fn render(caps: &Captures, arg: &Value) -> Result<String> {
    let length = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    let conversion = &caps[3];
    let mismatch = || {
        Error::FormatError(format!(
            "`%{}{}` given a {} argument",
            length,
            conversion,
            arg.type_name()
        ))
    };

    match conversion {
        "d" | "i" => {
            let bits = arg.as_int().map_err(|_| mismatch())?;
            Ok(match length {
                "hh" => (bits as i8).to_string(),
                "h" => (bits as i16).to_string(),
                "" => (bits as i32).to_string(),
                _ => bits.to_string(),
            })
        }
        "u" | "x" => {
            let bits = arg.as_int().map_err(|_| mismatch())? as u64;
            let bits = match length {
                "hh" => bits as u8 as u64,
                "h" => bits as u16 as u64,
                "" => bits as u32 as u64,
                _ => bits,
            };
            Ok(if conversion == "u" {
                bits.to_string()
            } else {
                format!("{:x}", bits)
            })
        }
        "p" => match arg {
            Value::Str(_) => Err(mismatch()),
            other => match other.as_int().map_err(|_| mismatch())? {
                0 => Ok("(nil)".to_string()),
                addr => Ok(format!("0x{:x}", addr as u64)),
            },
        },
        "s" => match arg {
            Value::Str(Some(s)) => Ok(s.clone()),
            Value::Str(None) | Value::Pointer(0) => Ok("(null)".to_string()),
            _ => Err(mismatch()),
        },
        other => Err(Error::FormatError(format!("unsupported conversion `{}`", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_directives_truncate_to_width() {
        assert_eq!(format("%d", &[Value::Int(6)]).unwrap(), "6");
        assert_eq!(format("%hhd", &[Value::Int(300)]).unwrap(), "44");
        assert_eq!(format("%lld", &[Value::Int(-5_000_000_000)]).unwrap(), "-5000000000");
        assert_eq!(format("%u", &[Value::Int(-1)]).unwrap(), "4294967295");
        assert_eq!(format("%llu", &[Value::UInt(u64::MAX)]).unwrap(), "18446744073709551615");
        assert_eq!(format("%x", &[Value::Int(255)]).unwrap(), "ff");
    }

    #[test]
    fn test_pointers_and_strings() {
        assert_eq!(format("%p", &[Value::Pointer(0)]).unwrap(), "(nil)");
        assert_eq!(format("%p", &[Value::Pointer(0x10)]).unwrap(), "0x10");
        assert_eq!(format("\"%s\"", &[Value::str("42")]).unwrap(), "\"42\"");
        assert_eq!(format("%s", &[Value::Str(None)]).unwrap(), "(null)");
    }

    #[test]
    fn test_literal_percent_and_text() {
        assert_eq!(
            format("n %% 2 = %d\n", &[Value::Int(1)]).unwrap(),
            "n % 2 = 1\n"
        );
        assert_eq!(format("\x1b[31m%d\x1b[0m", &[Value::Int(3)]).unwrap(), "\x1b[31m3\x1b[0m");
    }

    #[test]
    fn test_argument_mismatch() {
        assert!(matches!(format("%d", &[]), Err(Error::FormatError(_))));
        assert!(matches!(
            format("x", &[Value::Int(1)]),
            Err(Error::FormatError(_))
        ));
        assert!(matches!(
            format("%s", &[Value::Int(1)]),
            Err(Error::FormatError(_))
        ));
    }
}
