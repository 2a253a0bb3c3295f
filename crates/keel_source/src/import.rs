//! Parsing of `import` clauses down to their target path literal.

/// Extracts the imported path from the text between `import` and `;`.
///
/// Accepted forms:
///
/// ```text
/// "path"
/// "path" as Alias
/// * as Alias from "path"
/// {A, B as C} from "path"
/// ```
///
/// Both quote styles are accepted. Escaped quotes inside the literal are
/// returned verbatim, without unescaping.
pub fn parse_import_clause(clause: &str) -> Result<String, String> {
    let s = clause.trim();
    match s.chars().next() {
        Some('"' | '\'') => {
            let (path, rest) = string_literal(s)?;
            let rest = rest.trim_start();
            if rest.is_empty() {
                return Ok(path);
            }
            let rest = keyword(rest, "as")?;
            let rest = identifier(rest.trim_start())?;
            expect_end(rest)?;
            Ok(path)
        }
        Some('*') => {
            let rest = keyword(s[1..].trim_start(), "as")?;
            let rest = identifier(rest.trim_start())?;
            from_clause(rest)
        }
        Some('{') => {
            let (body, rest) = s[1..]
                .split_once('}')
                .ok_or_else(|| "unterminated symbol list".to_string())?;
            symbol_list(body)?;
            from_clause(rest)
        }
        Some(c) => Err(format!("unexpected '{c}'")),
        None => Err("empty import".to_string()),
    }
}

fn from_clause(rest: &str) -> Result<String, String> {
    let rest = keyword(rest.trim_start(), "from")?;
    let (path, rest) = string_literal(rest.trim_start())?;
    expect_end(rest)?;
    Ok(path)
}

fn expect_end(rest: &str) -> Result<(), String> {
    let rest = rest.trim();
    if rest.is_empty() {
        Ok(())
    } else {
        Err(format!("unexpected trailing text '{rest}'"))
    }
}

/// Reads a quoted literal at the start of `s`; returns its body and the rest.
fn string_literal(s: &str) -> Result<(String, &str), String> {
    let quote = match s.as_bytes().first() {
        Some(&q @ (b'"' | b'\'')) => q,
        _ => return Err("expected a string literal".to_string()),
    };
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => {
                let body = &s[1..i];
                if body.is_empty() {
                    return Err("empty import path".to_string());
                }
                return Ok((body.to_string(), &s[i + 1..]));
            }
            _ => i += 1,
        }
    }
    Err("unterminated string literal".to_string())
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Consumes an identifier at the start of `s`; returns the rest.
fn identifier(s: &str) -> Result<&str, String> {
    match s.chars().next() {
        Some(c) if is_ident_start(c) => {
            let end = s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len());
            Ok(&s[end..])
        }
        _ => Err("expected an identifier".to_string()),
    }
}

/// Consumes keyword `kw` at the start of `s`, requiring a word boundary.
fn keyword<'a>(s: &'a str, kw: &str) -> Result<&'a str, String> {
    match s.strip_prefix(kw) {
        Some(rest) if !rest.starts_with(is_ident_char) => Ok(rest),
        _ => Err(format!("expected '{kw}'")),
    }
}

fn symbol_list(body: &str) -> Result<(), String> {
    if body.trim().is_empty() {
        return Err("empty symbol list".to_string());
    }
    for item in body.split(',') {
        let rest = identifier(item.trim_start())?;
        let rest = rest.trim_start();
        if rest.is_empty() {
            continue;
        }
        let rest = keyword(rest, "as")?;
        let rest = identifier(rest.trim_start())?;
        expect_end(rest)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_path() {
        assert_eq!(parse_import_clause(" \"./a.sol\"").unwrap(), "./a.sol");
        assert_eq!(parse_import_clause("'lib/b.sol'").unwrap(), "lib/b.sol");
    }

    #[test]
    fn path_with_alias() {
        assert_eq!(parse_import_clause("\"a.sol\" as A").unwrap(), "a.sol");
        assert!(parse_import_clause("\"a.sol\" as").is_err());
        assert!(parse_import_clause("\"a.sol\" A").is_err());
    }

    #[test]
    fn star_import() {
        assert_eq!(
            parse_import_clause(" * as Lib from \"./lib.sol\"").unwrap(),
            "./lib.sol"
        );
        assert_eq!(parse_import_clause("*as Lib from'x.sol'").unwrap(), "x.sol");
        assert!(parse_import_clause("* from \"x.sol\"").is_err());
    }

    #[test]
    fn symbol_import() {
        assert_eq!(
            parse_import_clause("{A, B as C} from \"@oz/token/ERC20.sol\"").unwrap(),
            "@oz/token/ERC20.sol"
        );
        assert_eq!(
            parse_import_clause("{\n  A,\n  B\n} from \"x.sol\"").unwrap(),
            "x.sol"
        );
        assert!(parse_import_clause("{} from \"x.sol\"").is_err());
        assert!(parse_import_clause("{A from \"x.sol\"").is_err());
        assert!(parse_import_clause("{A} \"x.sol\"").is_err());
    }

    #[test]
    fn escaped_quote_kept_verbatim() {
        assert_eq!(parse_import_clause(r#""we\"ird.sol""#).unwrap(), r#"we\"ird.sol"#);
    }

    #[test]
    fn malformed() {
        assert!(parse_import_clause("").is_err());
        assert!(parse_import_clause("\"unterminated").is_err());
        assert!(parse_import_clause("\"\"").is_err());
        assert!(parse_import_clause("\"a.sol\" as A extra").is_err());
        assert!(parse_import_clause("foo").is_err());
    }
}
