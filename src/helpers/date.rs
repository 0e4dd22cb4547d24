//! Date helper functions

use chrono::{DateTime, Datelike, TimeZone};

const MONTHS_PT_BR: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];

const MONTHS_SHORT_PT_BR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Format a date using a Moment.js-style format string
///
/// Month names (`MMM`, `MMMM`) follow `language`; `pt-BR` and `pt` use
/// Portuguese names, anything else English ones.
///
/// # Examples
/// ```ignore
/// format_date(&date, "DD MMM YYYY", "pt-BR") // -> "15 mar 2021"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, format: &str, language: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let chrono_format = moment_to_chrono_format(format, date.month0() as usize, language);
    date.format(&chrono_format).to_string()
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

fn is_portuguese(language: &str) -> bool {
    let lang = language.to_ascii_lowercase();
    lang == "pt" || lang.starts_with("pt-") || lang.starts_with("pt_")
}

/// Convert Moment.js format to chrono format
///
/// Month names are written out directly so they can be localized; every
/// other character is kept as a literal.
fn moment_to_chrono_format(format: &str, month0: usize, language: &str) -> String {
    // Longest tokens first
    let tokens: [(&str, &str); 14] = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", ""),
        ("MMM", ""),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("ZZ", "%z"),
    ];

    let mut result = String::with_capacity(format.len() * 2);
    let mut rest = format;

    'outer: while !rest.is_empty() {
        for (token, chrono) in tokens {
            if let Some(after) = rest.strip_prefix(token) {
                match token {
                    "MMMM" | "MMM" => {
                        result.push_str(&month_name(month0, token == "MMMM", language).replace('%', "%%"))
                    }
                    _ => result.push_str(chrono),
                }
                rest = after;
                continue 'outer;
            }
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            if c == '%' {
                result.push_str("%%");
            } else {
                result.push(c);
            }
        }
        rest = chars.as_str();
    }

    result
}

fn month_name(month0: usize, long: bool, language: &str) -> String {
    const MONTHS_EN: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];

    let month0 = month0.min(11);
    if is_portuguese(language) {
        if long {
            MONTHS_PT_BR[month0].to_string()
        } else {
            MONTHS_SHORT_PT_BR[month0].to_string()
        }
    } else if long {
        MONTHS_EN[month0].to_string()
    } else {
        MONTHS_EN[month0][..3].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn date() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2021, 3, 15, 19, 25, 28)
            .unwrap()
    }

    #[test]
    fn test_format_date_portuguese() {
        assert_eq!(format_date(&date(), "DD MMM YYYY", "pt-BR"), "15 mar 2021");
        assert_eq!(
            format_date(&date(), "DD [de] MMMM", "pt-BR"),
            "15 [de] março"
        );
    }

    #[test]
    fn test_format_date_english() {
        assert_eq!(format_date(&date(), "DD MMM YYYY", "en"), "15 Mar 2021");
        assert_eq!(format_date(&date(), "YYYY-MM-DD HH:mm", "en"), "2021-03-15 19:25");
    }

    #[test]
    fn test_literal_percent_is_kept() {
        assert_eq!(format_date(&date(), "100% YYYY", "en"), "100% 2021");
    }

    #[test]
    fn test_date_xml() {
        assert_eq!(date_xml(&date()), "2021-03-15T19:25:28+00:00");
    }

    #[test]
    fn test_moment_to_chrono() {
        assert_eq!(moment_to_chrono_format("YYYY-MM-DD", 0, "en"), "%Y-%m-%d");
        assert_eq!(moment_to_chrono_format("HH:mm:ss", 0, "en"), "%H:%M:%S");
        assert_eq!(moment_to_chrono_format("MMM", 11, "pt-BR"), "dez");
    }
}
