//! Pure list deduplication, independent of the merge engine that calls it.

pub mod network;

use std::collections::HashSet;

use confmerge_model::Value;

/// Semantic tag a caller attaches to a list so `Strategy::Auto` can pick an
/// equivalence relation without the caller having to know the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticTag {
    Dns,
    IpAddr,
    Server,
    Ports,
    Proto,
    Target,
    Policy,
    Other(String),
}

impl SemanticTag {
    /// Parse the tag name as the host config system spells it (the list's
    /// option name, lowercased), matching the UCI option names this engine
    /// was distilled from: `dns`, `ipaddr`, `server`, `ports`, `proto`,
    /// `target`, `policy`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "dns" => SemanticTag::Dns,
            "ipaddr" => SemanticTag::IpAddr,
            "server" => SemanticTag::Server,
            "ports" => SemanticTag::Ports,
            "proto" => SemanticTag::Proto,
            "target" => SemanticTag::Target,
            "policy" => SemanticTag::Policy,
            other => SemanticTag::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    PreserveOrder,
    NetworkAware,
    PriorityBased,
    /// Resolve via [`SemanticTag`] per spec §4.1's auto-selection policy.
    Auto,
}

/// Resolve `Auto` (and numeric-only gating for `ports`) into a concrete
/// strategy. Exposed separately so callers (and tests) can inspect the
/// selection without running a dedupe pass.
pub fn resolve_strategy(strategy: Strategy, tag: &SemanticTag, list: &[Value]) -> Strategy {
    match strategy {
        Strategy::Auto => match tag {
            SemanticTag::Dns | SemanticTag::IpAddr | SemanticTag::Server => Strategy::NetworkAware,
            SemanticTag::Ports => {
                if list.iter().all(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit())) {
                    Strategy::NetworkAware
                } else {
                    Strategy::PreserveOrder
                }
            }
            SemanticTag::Proto | SemanticTag::Target | SemanticTag::Policy => Strategy::PriorityBased,
            SemanticTag::Other(_) => Strategy::PreserveOrder,
        },
        other => other,
    }
}

/// Deduplicate `list` under `strategy` (resolving `Auto` via `tag` first).
///
/// Pure, idempotent, length-monotone, and order-stable within the chosen
/// strategy (spec §4.1 guarantees; see the invariant tests below).
pub fn dedupe(list: &[Value], tag: &SemanticTag, strategy: Strategy) -> (Vec<Value>, usize) {
    match resolve_strategy(strategy, tag, list) {
        Strategy::NetworkAware => dedupe_by_key(list, network::canonicalize, true),
        Strategy::PreserveOrder | Strategy::PriorityBased => {
            dedupe_by_key(list, |v| v.to_string(), false)
        }
        Strategy::Auto => unreachable!("resolve_strategy never returns Auto"),
    }
}

fn dedupe_by_key(
    list: &[Value],
    key_fn: impl Fn(&str) -> String,
    keep_canonical: bool,
) -> (Vec<Value>, usize) {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(list.len());
    for v in list {
        let key = key_fn(v);
        if seen.insert(key.clone()) {
            out.push(if keep_canonical { key } else { v.clone() });
        }
    }
    let removed = list.len() - out.len();
    (out, removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserve_order_keeps_first_occurrence() {
        let list = vec!["a".into(), "b".into(), "a".into(), "c".into()];
        let (out, removed) = dedupe(&list, &SemanticTag::Other("x".into()), Strategy::PreserveOrder);
        assert_eq!(out, vec!["a", "b", "c"]);
        assert_eq!(removed, 1);
    }

    #[test]
    fn network_aware_merges_equivalent_forms_and_keeps_canonical() {
        let list = vec!["192.168.1.1".into(), "192.168.001.001".into(), "8.8.8.8".into()];
        let (out, removed) = dedupe(&list, &SemanticTag::IpAddr, Strategy::NetworkAware);
        assert_eq!(out, vec!["192.168.1.1", "8.8.8.8"]);
        assert_eq!(removed, 1);
    }

    #[test]
    fn priority_based_discards_later_duplicates_regardless_of_value() {
        let list = vec!["DROP".into(), "ACCEPT".into(), "DROP".into()];
        let (out, removed) = dedupe(&list, &SemanticTag::Target, Strategy::PriorityBased);
        assert_eq!(out, vec!["DROP", "ACCEPT"]);
        assert_eq!(removed, 1);
    }

    #[test]
    fn auto_selects_network_aware_for_dns_tag() {
        let list = vec!["1.1.1.1".into(), "001.001.001.001".into()];
        let (out, removed) = dedupe(&list, &SemanticTag::Dns, Strategy::Auto);
        assert_eq!(out, vec!["1.1.1.1"]);
        assert_eq!(removed, 1);
    }

    #[test]
    fn auto_selects_priority_based_for_proto_tag() {
        let list = vec!["tcp".into(), "udp".into(), "tcp".into()];
        let (out, removed) = dedupe(&list, &SemanticTag::Proto, Strategy::Auto);
        assert_eq!(out, vec!["tcp", "udp"]);
        assert_eq!(removed, 1);
    }

    #[test]
    fn auto_falls_back_to_preserve_order_for_unknown_tag() {
        let list = vec!["x".into(), "x".into()];
        let (out, _) = dedupe(&list, &SemanticTag::Other("custom".into()), Strategy::Auto);
        assert_eq!(out, vec!["x"]);
    }

    #[test]
    fn auto_ports_numeric_uses_network_aware() {
        let list = vec!["80".into(), "080".into()];
        let resolved = resolve_strategy(Strategy::Auto, &SemanticTag::Ports, &list);
        assert_eq!(resolved, Strategy::NetworkAware);
    }

    #[test]
    fn auto_ports_non_numeric_uses_preserve_order() {
        let list = vec!["http".into(), "https".into()];
        let resolved = resolve_strategy(Strategy::Auto, &SemanticTag::Ports, &list);
        assert_eq!(resolved, Strategy::PreserveOrder);
    }

    #[test]
    fn idempotent() {
        let list = vec!["a".into(), "a".into(), "b".into()];
        let (once, _) = dedupe(&list, &SemanticTag::Other("x".into()), Strategy::PreserveOrder);
        let (twice, removed_twice) =
            dedupe(&once, &SemanticTag::Other("x".into()), Strategy::PreserveOrder);
        assert_eq!(once, twice);
        assert_eq!(removed_twice, 0);
    }

    #[test]
    fn length_monotone() {
        let list = vec!["a".into(), "a".into(), "a".into()];
        let (out, _) = dedupe(&list, &SemanticTag::Other("x".into()), Strategy::PreserveOrder);
        assert!(out.len() <= list.len());
    }

    #[test]
    fn empty_list_is_a_no_op() {
        let list: Vec<Value> = vec![];
        let (out, removed) = dedupe(&list, &SemanticTag::Dns, Strategy::Auto);
        assert!(out.is_empty());
        assert_eq!(removed, 0);
    }
}
