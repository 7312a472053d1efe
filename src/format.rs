//! Text formatting for labels

/// Group an integer with `.` as thousands separator
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Round to an integer and format it the Dutch way, e.g. `12.345`
pub fn integer(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}", sign, group_thousands(rounded.abs() as u64))
}

/// Format with a fixed number of decimals, `,` as decimal mark
pub fn decimal(value: f64, decimals: usize) -> String {
    if decimals == 0 {
        return integer(value);
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let whole: u64 = whole.parse().unwrap_or(0);
    let sign = if value < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    format!("{}{},{}", sign, group_thousands(whole), frac)
}

/// Label for a point total, e.g. `1.234 pts`
pub fn points(value: f64) -> String {
    format!("{} pts", integer(value))
}

/// Percentage of a 0..1 fraction, e.g. `42%`
pub fn percent(fraction: f64) -> String {
    format!("{}%", integer(fraction * 100.0))
}

fn is_upper_token(token: &str) -> bool {
    token.chars().any(char::is_alphabetic) && !token.chars().any(char::is_lowercase)
}

/// Compact label for a rider name
///
/// Exports write names as `SURNAME Given`, with multi-word surnames fully
/// capitalised (`VAN DER POEL Mathieu`). The leading all-uppercase tokens are
/// the surname. A name with no uppercase prefix is returned whole.
pub fn last_name(full_name: &str) -> String {
    let surname: Vec<&str> = full_name
        .split_whitespace()
        .take_while(|t| is_upper_token(t))
        .collect();

    if surname.is_empty() {
        full_name.trim().to_string()
    } else {
        surname.join(" ")
    }
}
