//! HTTP binding classification for structure members.

use std::collections::BTreeSet;

use smithy_mcp_common::{Channel, HttpBinding, ParsedMember};

use crate::ast::{traits, TraitMap};

/// Classify a member into exactly one request channel. Trait priority runs
/// label, query, header, prefix headers, query params, payload; members
/// whose name appears as a URI placeholder fall back to label, the rest
/// travel in the body.
pub fn classify_member(
    member_name: &str,
    member_traits: &TraitMap,
    uri_labels: &BTreeSet<String>,
) -> HttpBinding {
    if member_traits.contains_key(traits::HTTP_LABEL) {
        return HttpBinding::new(Channel::Label);
    }
    if let Some(name) = trait_string(member_traits, traits::HTTP_QUERY) {
        return HttpBinding::named(Channel::Query, name);
    }
    if let Some(name) = trait_string(member_traits, traits::HTTP_HEADER) {
        return HttpBinding::named(Channel::Header, name);
    }
    if let Some(prefix) = trait_string(member_traits, traits::HTTP_PREFIX_HEADERS) {
        return HttpBinding::named(Channel::PrefixHeaders, prefix);
    }
    if member_traits.contains_key(traits::HTTP_QUERY_PARAMS) {
        return HttpBinding::new(Channel::QueryParams);
    }
    if member_traits.contains_key(traits::HTTP_PAYLOAD) {
        return HttpBinding::new(Channel::Payload);
    }
    if uri_labels.contains(member_name) {
        return HttpBinding::new(Channel::Label);
    }
    HttpBinding::new(Channel::Body)
}

fn trait_string(member_traits: &TraitMap, trait_id: &str) -> Option<String> {
    member_traits
        .get(trait_id)
        .and_then(|v| v.as_str())
        .map(String::from)
}

/// Extract `{placeholder}` names from a URI template.
pub fn uri_labels(uri: &str) -> BTreeSet<String> {
    let mut labels = BTreeSet::new();
    let mut rest = uri;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        let label = rest[open + 1..open + close].trim_end_matches('+');
        if !label.is_empty() {
            labels.insert(label.to_string());
        }
        rest = &rest[open + close + 1..];
    }
    labels
}

/// Check that URI placeholders and label-bound members line up. Mismatches
/// are logged, never fatal; the request synthesizer leaves unresolved
/// placeholders in place.
pub fn check_label_coverage(operation_name: &str, uri: &str, members: &[ParsedMember]) {
    let labels = uri_labels(uri);
    let bound: BTreeSet<String> = members
        .iter()
        .filter(|m| {
            matches!(
                m.http_binding,
                Some(HttpBinding {
                    channel: Channel::Label,
                    ..
                })
            )
        })
        .map(|m| m.name.clone())
        .collect();

    for label in labels.difference(&bound) {
        log::warn!(
            "{operation_name}: URI placeholder {{{label}}} has no label-bound input member"
        );
    }
    for member in bound.difference(&labels) {
        log::warn!(
            "{operation_name}: member {member} is label-bound but {uri} has no {{{member}}} placeholder"
        );
    }
}
