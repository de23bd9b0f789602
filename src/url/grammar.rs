//! RFC 3986 productions used by the URL parser.
//!
//! Every component pattern is anchored with `^` and is applied to the
//! unconsumed suffix of the input, so a component can only match exactly
//! where the previous one ended.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use super::Component;

const UNRESERVED: &str = r"[a-z0-9._~\-]";
const SUB_DELIMS: &str = r"[!$&'()*+,;=]";
const PCT_ENCODED: &str = r"%[0-9a-f]{2}";
const H16: &str = r"[0-9a-f]{1,4}";
const DEC_OCTET: &str = r"(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])";

fn ipv4_address() -> String {
    format!(r"{DEC_OCTET}\.{DEC_OCTET}\.{DEC_OCTET}\.{DEC_OCTET}")
}

fn ipv6_address() -> String {
    let h = H16;
    let ls32 = format!("(?:{h}:{h}|{})", ipv4_address());
    [
        format!("(?:{h}:){{6}}{ls32}"),
        format!("::(?:{h}:){{5}}{ls32}"),
        format!("(?:{h})?::(?:{h}:){{4}}{ls32}"),
        format!("(?:(?:{h}:){{0,1}}{h})?::(?:{h}:){{3}}{ls32}"),
        format!("(?:(?:{h}:){{0,2}}{h})?::(?:{h}:){{2}}{ls32}"),
        format!("(?:(?:{h}:){{0,3}}{h})?::{h}:{ls32}"),
        format!("(?:(?:{h}:){{0,4}}{h})?::{ls32}"),
        format!("(?:(?:{h}:){{0,5}}{h})?::{h}"),
        format!("(?:(?:{h}:){{0,6}}{h})?::"),
    ]
    .iter()
    .map(|alt| format!("(?:{alt})"))
    .collect::<Vec<_>>()
    .join("|")
}

fn reg_name() -> String {
    format!("(?:{UNRESERVED}|{SUB_DELIMS}|{PCT_ENCODED})+")
}

fn pchar() -> String {
    format!("(?:{UNRESERVED}|{SUB_DELIMS}|[:@]|{PCT_ENCODED})")
}

fn path_abempty() -> String {
    format!("(?:/{}*)+", pchar())
}

fn path_noscheme() -> String {
    format!(
        "(?:{UNRESERVED}|{SUB_DELIMS}|@|{PCT_ENCODED})+(?:/{}*)*",
        pchar()
    )
}

fn path_rootless() -> String {
    let p = pchar();
    format!("{p}+(?:/{p}*)*")
}

fn query() -> String {
    format!(r"\?(?:{}|[/?])*", pchar())
}

fn fragment() -> String {
    format!("#(?:{}|[/?])*", pchar())
}

fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("URL grammar pattern must compile")
}

fn component_pattern(component: Component) -> String {
    match component {
        Component::Scheme => r"^[a-z][a-z0-9+.\-]*://".to_string(),
        Component::Userinfo => format!("^(?:{UNRESERVED}|{SUB_DELIMS}|:|{PCT_ENCODED})+@"),
        // IPv4 literals are also reg-names; `host_kind` tells them apart.
        Component::Host => format!(r"^(?:\[(?:{})\]|{})", ipv6_address(), reg_name()),
        Component::Port => "^:[0-9]*".to_string(),
        Component::Path => format!("^{}", path_abempty()),
        Component::Query => format!("^{}", query()),
        Component::Fragment => format!("^{}", fragment()),
    }
}

static COMPONENTS: Lazy<Vec<Regex>> = Lazy::new(|| {
    Component::ALL
        .iter()
        .map(|c| compile(&component_pattern(*c)))
        .collect()
});

static PATH_ONLY: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        "^(?:{}|{}|{})(?:{})?(?:{})?$",
        path_abempty(),
        path_noscheme(),
        path_rootless(),
        query(),
        fragment()
    ))
});

static IPV4_LITERAL: Lazy<Regex> = Lazy::new(|| compile(&format!("^{}$", ipv4_address())));

static IPV6_LITERAL: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"^\[(?:{})\]$", ipv6_address())));

/// Length of the match of `component` at the very start of `input`.
pub(crate) fn match_at_start(component: Component, input: &str) -> Option<usize> {
    COMPONENTS[component as usize]
        .find(input)
        .map(|m| m.end())
}

pub(crate) fn is_path_reference(input: &str) -> bool {
    PATH_ONLY.is_match(input)
}

pub(crate) fn is_ipv4_literal(host: &str) -> bool {
    IPV4_LITERAL.is_match(host)
}

pub(crate) fn is_ipv6_literal(host: &str) -> bool {
    IPV6_LITERAL.is_match(host)
}
