//! Display formatting for report tables

/// Signed percentage, e.g. `+12.50 %`; `-` when undefined
pub fn fmt_pct(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{}{} %", if x >= 0.0 { "+" } else { "" }, group2(x)),
        _ => "-".to_string(),
    }
}

/// VEE amount with two decimals; `-` when undefined
pub fn fmt_vee(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => group2(x),
        _ => "-".to_string(),
    }
}

/// USD amount with four decimals (token prices are small); `-` when undefined
pub fn fmt_usd(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            let sign = if x < 0.0 { "-" } else { "" };
            format!("{}${:.4}", sign, x.abs())
        }
        _ => "-".to_string(),
    }
}

/// Share of pool as percent with four decimals
pub fn fmt_share(share: f64) -> String {
    format!("{:.4} %", share * 100.0)
}

/// Two decimals with thousands separators
fn group2(x: f64) -> String {
    let s = format!("{:.2}", x.abs());
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if x < 0.0 && s != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}
