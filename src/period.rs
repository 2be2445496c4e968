//! Fiscal-period label parsing.
//!
//! Disclosure filings interleave Gregorian and Japanese-era dating and mix
//! numeral scripts inside the same free-text label, e.g.
//! `第121期 第３四半期(自 2023年10月1日 至 2023年12月31日)`. The parsers
//! here are total: they never fail, they return `None`, so the caller can
//! apply one fatal/non-fatal policy uniformly.

use crate::model::Quarter;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

/// First Gregorian year of each supported era ("year 1" of the era).
pub const ERA_EPOCHS: &[(&str, i32)] = &[("令和", 2019), ("平成", 1989), ("昭和", 1926)];

/// Literal token for the first year of an era, written instead of the
/// digit 1 (e.g. 令和元年 for 2019).
pub const ERA_FIRST_YEAR_TOKEN: &str = "元";

/// Plausible range for a bare 4-digit fiscal year.
const FISCAL_YEAR_MIN: i32 = 1990;
const FISCAL_YEAR_MAX: i32 = 2100;

static GREGORIAN_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"自\s*([0-9０-９]{4})\s*年.*?至\s*([0-9０-９]{4})\s*年").unwrap()
});

static ERA_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"自\s*(令和|平成|昭和)\s*(元|[0-9０-９]+)\s*年.*?至\s*(令和|平成|昭和)\s*(元|[0-9０-９]+)\s*年")
        .unwrap()
});

static BARE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9０-９]{4}").unwrap());

static QUARTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"第\s*([0-4０-４一二三四１２３４]+)\s*四半期").unwrap());

/// Extracts a 4-digit fiscal year from a free-text fiscal-period label.
///
/// Tried in order:
/// 1. Gregorian `自 YYYY年 … 至 YYYY年` date range; the fiscal year is the
///    **end** year (fiscal year is defined by period end, not start).
/// 2. Era-based range (era name + era year, where the year may be the
///    first-year token `元`); the end era-year is converted via
///    [`ERA_EPOCHS`].
/// 3. A bare 4-digit number, accepted only within [1990, 2100].
pub fn extract_fiscal_year(content: &str) -> Option<String> {
    if let Some(caps) = GREGORIAN_RANGE.captures(content) {
        let end_year: i32 = normalize_digits(&caps[2]).parse().ok()?;
        return Some(end_year.to_string());
    }

    if let Some(caps) = ERA_RANGE.captures(content) {
        let era = caps.get(3).map(|m| m.as_str())?;
        let era_year = parse_era_year(&caps[4])?;
        let epoch = era_epoch(era)?;
        return Some((epoch + era_year - 1).to_string());
    }

    if let Some(m) = BARE_YEAR.find(content) {
        let year: i32 = normalize_digits(m.as_str()).parse().ok()?;
        if (FISCAL_YEAR_MIN..=FISCAL_YEAR_MAX).contains(&year) {
            return Some(year.to_string());
        }
    }

    warn!("Failed to extract a fiscal year from '{}'", content);
    None
}

/// Extracts the quarter from a `第 <numeral> 四半期` pattern, where the
/// numeral may be an ASCII digit, a full-width digit, or a kanji numeral.
pub fn extract_quarter(content: &str) -> Option<Quarter> {
    let caps = match QUARTER.captures(content) {
        Some(caps) => caps,
        None => {
            warn!("Failed to extract a quarter from '{}'", content);
            return None;
        }
    };

    let token = caps[1].trim().to_string();
    let quarter = convert_quarter_numeral(&token).and_then(Quarter::from_number);
    if quarter.is_none() {
        warn!("Failed to convert quarter numeral '{}' in '{}'", token, content);
    }
    quarter
}

/// Converts a quarter numeral in any of the three scripts to an integer,
/// falling back to a direct parse for other digit-like tokens.
fn convert_quarter_numeral(token: &str) -> Option<u32> {
    let mapped = match token {
        "一" | "１" | "1" => Some(1),
        "二" | "２" | "2" => Some(2),
        "三" | "３" | "3" => Some(3),
        "四" | "４" | "4" => Some(4),
        _ => None,
    };
    if mapped.is_some() {
        return mapped;
    }

    normalize_digits(token).parse().ok()
}

fn parse_era_year(token: &str) -> Option<i32> {
    if token == ERA_FIRST_YEAR_TOKEN {
        return Some(1);
    }
    normalize_digits(token).parse().ok()
}

fn era_epoch(era: &str) -> Option<i32> {
    ERA_EPOCHS
        .iter()
        .find(|(name, _)| *name == era)
        .map(|(_, epoch)| *epoch)
}

/// Replaces full-width digits with their ASCII equivalents.
fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            _ => c,
        })
        .collect()
}
