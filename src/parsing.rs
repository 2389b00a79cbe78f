use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_till1},
    character::complete::{char, space0, space1},
    combinator::all_consuming,
    multi::separated_list1,
    number::complete::double,
    sequence::delimited,
    IResult,
};

/// Column separator: a comma with optional padding, or plain whitespace
fn separator(input: &str) -> IResult<&str, &str> {
    alt((delimited(space0, tag(","), space0), space1))(input)
}

/// A complete line of numbers
pub(crate) fn row(line: &str) -> IResult<&str, Vec<f64>> {
    all_consuming(delimited(space0, separated_list1(separator, double), space0))(line)
}

/// A column name, optionally in double quotes
fn name(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), is_not("\""), char('"')),
        take_till1(|c: char| c == ',' || c.is_whitespace()),
    ))(input)
}

/// A complete line of column names
pub(crate) fn header(line: &str) -> IResult<&str, Vec<&str>> {
    all_consuming(delimited(space0, separated_list1(separator, name), space0))(line)
}

/// Strip a trailing `#` comment
pub(crate) fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows() {
        assert_eq!(row("1 2.5\t-3e2").unwrap().1, [1., 2.5, -300.]);
        assert_eq!(row("  0.5, 1.5 ,2  ").unwrap().1, [0.5, 1.5, 2.]);
        assert!(row("1 two 3").is_err());
        assert!(row("").is_err());
    }

    #[test]
    fn headers() {
        assert_eq!(header("pt,cross").unwrap().1, ["pt", "cross"]);
        assert_eq!(header(" \"pt\" , \"cross\" ").unwrap().1, ["pt", "cross"]);
        assert_eq!(header("pT RaaLow RaaHigh").unwrap().1, ["pT", "RaaLow", "RaaHigh"]);
        assert!(header("").is_err());
    }

    #[test]
    fn comments() {
        assert_eq!(strip_comment("1 2 # pT Raa"), "1 2 ");
        assert_eq!(strip_comment("# header"), "");
        assert_eq!(strip_comment("1 2"), "1 2");
    }
}
