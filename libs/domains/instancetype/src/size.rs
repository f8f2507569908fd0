//! VM size name parser
//!
//! Grammar (case-sensitive, positional):
//!
//! ```text
//! [Family][Subfamily?][vCPUs][-ConstrainedvCPUs?][AdditiveFeatures?][_Accelerator?][_Version?][_Promo?]
//! ```
//!
//! e.g. `NC4as_T4_v3` is family `N`, subfamily `C`, 4 vCPUs, features `a`+`s`,
//! accelerator `T4`, version `v3`.

use serde::Serialize;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::SizeParseError;
use crate::labels::MULTI_CHAR_ADDITIVE_FEATURES;

/// Structural fields decoded from a size name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedSize {
    pub family: char,
    pub subfamily: Option<char>,
    pub vcpus: u32,
    pub constrained_vcpus: Option<u32>,
    /// Feature tokens in order of appearance; mostly single characters
    pub additive_features: Vec<String>,
    pub accelerator: Option<String>,
    /// `v3`, `V2`, ... or empty
    pub version: String,
}

impl ParsedSize {
    /// Grouping key: family, subfamily, features, then `_version` if any
    pub fn series(&self) -> String {
        let mut series = String::new();
        series.push(self.family);
        if let Some(subfamily) = self.subfamily {
            series.push(subfamily);
        }
        for feature in &self.additive_features {
            series.push_str(feature);
        }
        if !self.version.is_empty() {
            series.push('_');
            series.push_str(&self.version);
        }
        series
    }

    pub fn has_feature(&self, token: &str) -> bool {
        self.additive_features.iter().any(|f| f == token)
    }
}

fn fail(input: &str, reason: &'static str) -> SizeParseError {
    SizeParseError {
        input: input.to_string(),
        reason,
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

fn take_additive_features(segment: &str) -> Option<Vec<String>> {
    let mut features = Vec::new();
    let mut rest = segment;
    while !rest.is_empty() {
        if let Some(token) = MULTI_CHAR_ADDITIVE_FEATURES
            .iter()
            .find(|t| rest.starts_with(**t))
        {
            features.push(token.to_string());
            rest = &rest[token.len()..];
            continue;
        }
        let c = rest.chars().next()?;
        if !c.is_ascii_alphabetic() {
            return None;
        }
        features.push(c.to_string());
        rest = &rest[c.len_utf8()..];
    }
    Some(features)
}

fn is_accelerator(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.clone().next().is_some()
        && chars.all(|c| c.is_ascii_digit())
}

fn is_version(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 2 && (bytes[0] == b'v' || bytes[0] == b'V') && (b'1'..=b'9').contains(&bytes[1])
}

/// Parse a size name such as `D2s_v3` or `M8-2ms_v2`
pub fn parse_size(size: &str) -> Result<ParsedSize, SizeParseError> {
    let (head, suffixes) = match size.split_once('_') {
        Some((head, rest)) => (head, Some(rest)),
        None => (size, None),
    };

    let mut chars = head.chars().peekable();

    let family = chars
        .next()
        .filter(char::is_ascii_uppercase)
        .ok_or_else(|| fail(size, "family must be one uppercase letter"))?;

    let subfamily = chars.next_if(char::is_ascii_uppercase);

    let vcpus = take_digits(&mut chars);
    if vcpus.is_empty() {
        return Err(fail(size, "missing vCPU count"));
    }
    let vcpus = vcpus
        .parse()
        .map_err(|_| fail(size, "vCPU count out of range"))?;

    let constrained_vcpus = if chars.next_if_eq(&'-').is_some() {
        let digits = take_digits(&mut chars);
        if digits.is_empty() {
            return Err(fail(size, "missing constrained vCPU count after '-'"));
        }
        Some(
            digits
                .parse()
                .map_err(|_| fail(size, "constrained vCPU count out of range"))?,
        )
    } else {
        None
    };

    let rest: String = chars.collect();
    let additive_features = take_additive_features(&rest)
        .ok_or_else(|| fail(size, "unexpected character in additive features"))?;

    let mut tokens: Vec<&str> = suffixes
        .map(|s| s.split('_').collect())
        .unwrap_or_default();
    if tokens.last() == Some(&"Promo") {
        tokens.pop();
    }

    // `V5` is both a valid accelerator and a valid version; a lone token is
    // the version, an accelerator is only taken when a version follows
    let (accelerator, version) = match tokens.as_slice() {
        [] => (None, String::new()),
        [only] if is_version(only) => (None, only.to_string()),
        [only] if is_accelerator(only) => (Some(only.to_string()), String::new()),
        [accel, ver] if is_accelerator(accel) && is_version(ver) => {
            (Some(accel.to_string()), ver.to_string())
        }
        _ => return Err(fail(size, "unrecognized suffix")),
    };

    Ok(ParsedSize {
        family,
        subfamily,
        vcpus,
        constrained_vcpus,
        additive_features,
        accelerator,
        version,
    })
}
