//! Syntactic IPv6 validation.
//!
//! The accepted grammar is the textual form used throughout the campus tooling: eight groups
//! of one to four hex digits, a single `::` elision anywhere, `fe80:` link-local addresses
//! carrying a `%zone` suffix, and the two dotted-quad transitional forms. Matching runs on
//! the `regex` crate's automata, so it is linear in the input length whatever the input.

use once_cell::sync::Lazy;
use regex::RegexSet;

const HEX_GROUP: &str = "[0-9a-fA-F]{1,4}";
const IPV4_OCTET: &str = "(?:25[0-5]|(?:2[0-4]|1?[0-9])?[0-9])";

/// Which textual form a valid address was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressForm {
    /// All eight groups present, e.g. `2001:0db8:0:0:0:0:0:1`.
    Full,
    /// Uses `::` to elide zero groups, e.g. `2001:db8::1`.
    Compressed,
    /// `fe80:` link-local with a zone index, e.g. `fe80::1%eth0`.
    LinkLocalZoned,
    /// `::a.b.c.d`, `::ffff:a.b.c.d` or `::ffff:0:a.b.c.d`.
    Ipv4Mapped,
    /// One to four groups, `::`, then a dotted quad, e.g. `64:ff9b::192.0.2.1`.
    Ipv4Embedded,
}

// Order matches the patterns returned by `form_patterns`.
const FORMS: [AddressForm; 5] = [
    AddressForm::Full,
    AddressForm::Compressed,
    AddressForm::LinkLocalZoned,
    AddressForm::Ipv4Mapped,
    AddressForm::Ipv4Embedded,
];

fn form_patterns() -> [String; 5] {
    let h = HEX_GROUP;
    let ipv4 = format!(r"(?:{o}\.){{3}}{o}", o = IPV4_OCTET);

    let full = format!("(?:{h}:){{7}}{h}");
    let compressed = [
        format!("(?:{h}:){{1,7}}:"),
        format!("(?:{h}:){{1,6}}:{h}"),
        format!("(?:{h}:){{1,5}}(?::{h}){{1,2}}"),
        format!("(?:{h}:){{1,4}}(?::{h}){{1,3}}"),
        format!("(?:{h}:){{1,3}}(?::{h}){{1,4}}"),
        format!("(?:{h}:){{1,2}}(?::{h}){{1,5}}"),
        format!("{h}:(?::{h}){{1,6}}"),
        format!(":(?:(?::{h}){{1,7}}|:)"),
    ]
    .join("|");
    let zoned = "fe80:(?::[0-9a-fA-F]{0,4}){0,4}%[0-9a-zA-Z]+".to_string();
    let mapped = format!("::(?:ffff(?::0{{1,4}})?:)?{ipv4}");
    let embedded = format!("(?:{h}:){{1,4}}:{ipv4}");

    [full, compressed, zoned, mapped, embedded].map(|body| format!("^(?:{})$", body))
}

static ADDRESS_FORMS: Lazy<RegexSet> =
    Lazy::new(|| RegexSet::new(form_patterns()).expect("IPv6 form patterns must compile"));

/// Returns the form `candidate` is written in, or `None` when it is not a valid IPv6 literal.
pub fn classify(candidate: &str) -> Option<AddressForm> {
    ADDRESS_FORMS
        .matches(candidate)
        .iter()
        .next()
        .map(|index| FORMS[index])
}

/// Format-only check of an IPv6 textual address. Never panics; empty input is invalid.
pub fn is_valid_address(candidate: &str) -> bool {
    ADDRESS_FORMS.is_match(candidate)
}
